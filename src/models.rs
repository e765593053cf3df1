//! Pizza documents and the request shapes that create or modify them.
//!
//! Field names follow the JSON the web client sends (`pizzaName`,
//! `createdBy`, ...), so every struct here is `camelCase` on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::object_id::new_object_id;
use crate::storage::StoreError;

/// Pizza sizes accepted by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PizzaSize {
    Personal,
    Small,
    Medium,
    #[default]
    Large,
    #[serde(rename = "Extra Large")]
    ExtraLarge,
}

impl std::fmt::Display for PizzaSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PizzaSize::Personal => write!(f, "Personal"),
            PizzaSize::Small => write!(f, "Small"),
            PizzaSize::Medium => write!(f, "Medium"),
            PizzaSize::Large => write!(f, "Large"),
            PizzaSize::ExtraLarge => write!(f, "Extra Large"),
        }
    }
}

/// A stored pizza with its embedded comments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pizza {
    #[serde(rename = "_id")]
    pub id: String,
    pub pizza_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub size: PizzaSize,
    #[serde(default)]
    pub toppings: Vec<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub comment_id: String,
    pub written_by: String,
    pub comment_body: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub replies: Vec<Reply>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub reply_id: String,
    pub written_by: String,
    pub reply_body: String,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/pizzas`. Also the payload shape buffered by the
/// offline queue.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPizza {
    #[serde(default)]
    pub pizza_name: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub size: Option<PizzaSize>,
    #[serde(default)]
    pub toppings: Vec<String>,
}

impl NewPizza {
    /// Apply defaults, assign an id and validate.
    pub fn into_pizza(self, now: DateTime<Utc>) -> Result<Pizza, StoreError> {
        let pizza = Pizza {
            id: new_object_id(),
            pizza_name: self.pizza_name.unwrap_or_default(),
            created_by: self.created_by,
            created_at: self.created_at.unwrap_or(now),
            size: self.size.unwrap_or_default(),
            toppings: self.toppings,
            comments: Vec::new(),
        };
        pizza.normalized()
    }
}

impl NewPizza {
    /// Run the checks `create` would run on a raw submission, without
    /// storing anything.
    pub fn check(payload: &serde_json::Value) -> Result<(), StoreError> {
        let new: NewPizza = serde_json::from_value(payload.clone())
            .map_err(|e| StoreError::Validation(e.to_string()))?;
        new.into_pizza(Utc::now()).map(|_| ())
    }
}

/// Body of `PUT /api/pizzas/:id`. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PizzaUpdate {
    #[serde(default)]
    pub pizza_name: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub size: Option<PizzaSize>,
    #[serde(default)]
    pub toppings: Option<Vec<String>>,
}

impl PizzaUpdate {
    /// Merge into `pizza`. Validation runs on the merged document, not here.
    pub fn apply_to(self, pizza: &mut Pizza) {
        if let Some(name) = self.pizza_name {
            pizza.pizza_name = name;
        }
        if let Some(created_by) = self.created_by {
            pizza.created_by = Some(created_by);
        }
        if let Some(size) = self.size {
            pizza.size = size;
        }
        if let Some(toppings) = self.toppings {
            pizza.toppings = toppings;
        }
    }
}

/// Body of `POST /api/comments/:pizzaId`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewComment {
    #[serde(default)]
    pub written_by: String,
    #[serde(default)]
    pub comment_body: String,
}

impl NewComment {
    pub fn into_comment(self, now: DateTime<Utc>) -> Result<Comment, StoreError> {
        Ok(Comment {
            comment_id: new_object_id(),
            written_by: required("writtenBy", self.written_by)?,
            comment_body: required("commentBody", self.comment_body)?,
            created_at: now,
            replies: Vec::new(),
        })
    }
}

/// Body of `PUT /api/comments/:pizzaId/:commentId`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReply {
    #[serde(default)]
    pub written_by: String,
    #[serde(default)]
    pub reply_body: String,
}

impl NewReply {
    pub fn into_reply(self, now: DateTime<Utc>) -> Result<Reply, StoreError> {
        Ok(Reply {
            reply_id: new_object_id(),
            written_by: required("writtenBy", self.written_by)?,
            reply_body: required("replyBody", self.reply_body)?,
            created_at: now,
        })
    }
}

impl Pizza {
    /// Trim string fields and reject documents that would not pass create.
    pub fn normalized(mut self) -> Result<Self, StoreError> {
        self.pizza_name = required("pizzaName", self.pizza_name)?;
        self.created_by = self
            .created_by
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        self.toppings = self
            .toppings
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        Ok(self)
    }
}

fn required(field: &str, value: String) -> Result<String, StoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StoreError::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

/// JSON that is either a single value or an array of them.
///
/// `POST /api/pizzas` accepts both and answers in the same shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}
