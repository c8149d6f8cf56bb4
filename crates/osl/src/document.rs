//! 📦 Documents: the fixed-schema records we hurl at the cluster.
//!
//! 🧠 Knowledge graph:
//! - Field names go over the wire in PascalCase (`Email`, `Age`, `PhoneNumber`...). Queries like
//!   `Age:[10 TO 20]` depend on that, so the `rename_all` below is load-bearing.
//! - No `_id`. Documents are created, never updated. Append-only, like regret.
//! - `LoginHistory` is part of the model but no document carries one yet.

use serde::{Deserialize, Serialize};

/// 🎯 One person-shaped document. Fake person, real JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Document {
    pub email: String,
    pub password: String,
    pub name: String,
    pub age: i32,
    pub height: i32,
    pub phone_number: String,
    pub latitude: f32,
    pub longitude: f32,
    pub tags: Vec<Tag>,
    pub article: Vec<Article>,
}

/// 🏷️ A single word with delusions of taxonomy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Article {
    #[serde(rename = "ID")]
    pub id: String,
    pub title: String,
    pub body: String,
    pub created_at: String,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoginHistory {
    pub logged_at: String,
    #[serde(rename = "IPV4")]
    pub ipv4: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn the_one_where_field_names_dress_in_pascal_case() -> Result<(), serde_json::Error> {
        let the_doc = Document {
            email: "a@b.com".to_string(),
            password: "pw".to_string(),
            name: "Ada".to_string(),
            age: 36,
            height: 170,
            phone_number: "555-0100".to_string(),
            latitude: 1.5,
            longitude: -2.5,
            tags: vec![Tag {
                name: "rust".to_string(),
            }],
            article: vec![Article {
                id: "a-1".to_string(),
                title: "t".to_string(),
                body: "b".to_string(),
                created_at: "2024-01-01 00:00:00".to_string(),
                tags: vec![],
            }],
        };

        let the_json = serde_json::to_value(&the_doc)?;
        assert_eq!(
            the_json,
            json!({
                "Email": "a@b.com",
                "Password": "pw",
                "Name": "Ada",
                "Age": 36,
                "Height": 170,
                "PhoneNumber": "555-0100",
                "Latitude": 1.5,
                "Longitude": -2.5,
                "Tags": [{"Name": "rust"}],
                "Article": [{
                    "ID": "a-1",
                    "Title": "t",
                    "Body": "b",
                    "CreatedAt": "2024-01-01 00:00:00",
                    "Tags": []
                }]
            })
        );

        let the_history = serde_json::to_value(LoginHistory {
            logged_at: "2024-01-01 00:00:00".to_string(),
            ipv4: "10.0.0.1".to_string(),
        })?;
        assert_eq!(the_history, json!({"LoggedAt": "2024-01-01 00:00:00", "IPV4": "10.0.0.1"}));
        Ok(())
    }
}
