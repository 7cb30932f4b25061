// src/model.rs
use bson::{doc, oid::ObjectId, Document};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    pub state: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleType {
    A,
    B,
    C,
}

impl ArticleType {
    pub fn as_str(self) -> &'static str {
        match self {
            ArticleType::A => "a",
            ArticleType::B => "b",
            ArticleType::C => "c",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: ArticleType,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Article {
    /// An untagged article, `article<n>` / `description<n>`.
    pub fn numbered(n: u32, kind: ArticleType) -> Self {
        Self {
            id: None,
            name: format!("article{n}"),
            description: format!("description{n}"),
            kind,
            tags: Vec::new(),
        }
    }

    pub fn to_document(&self) -> Document {
        let mut document = doc! {
            "name": &self.name,
            "description": &self.description,
            "type": self.kind.as_str(),
            "tags": self.tags.clone(),
        };
        if let Some(id) = self.id {
            document.insert("_id", id);
        }
        document
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    #[serde(default)]
    pub scores: Vec<Score>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    #[serde(rename = "type")]
    pub kind: String,
    pub score: f64,
}

/// Row produced by the worst-homework aggregation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorstHomework {
    pub name: String,
    pub worst_homework_score: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HomeworkAverage {
    pub avg_score: f64,
}

/// Row produced by the per-student average aggregation; grouped by name.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StudentAverage {
    #[serde(rename = "_id")]
    pub name: String,
    pub avg_score: f64,
}
