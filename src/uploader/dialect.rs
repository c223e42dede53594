use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::errors::{AppError, AppResult};

/// Chat bridge implementations we know how to talk to.
///
/// They share the OneBot upload endpoints but disagree on how a group
/// folder is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlatformDialect {
    NapCat,
    LLOneBot,
    Lagrange,
}

/// Field layout of a `create_group_file_folder` request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FolderRequestShape {
    pub name_field: &'static str,
    pub parent_id: Option<&'static str>,
}

impl PlatformDialect {
    pub const ALL: [PlatformDialect; 3] = [
        PlatformDialect::NapCat,
        PlatformDialect::LLOneBot,
        PlatformDialect::Lagrange,
    ];

    pub fn identifier(self) -> &'static str {
        match self {
            PlatformDialect::NapCat => "napcat",
            PlatformDialect::LLOneBot => "llonebot",
            PlatformDialect::Lagrange => "lagrange",
        }
    }

    pub fn folder_request_shape(self) -> FolderRequestShape {
        match self {
            PlatformDialect::NapCat => FolderRequestShape {
                name_field: "folder_name",
                parent_id: None,
            },
            PlatformDialect::LLOneBot => FolderRequestShape {
                name_field: "name",
                parent_id: None,
            },
            PlatformDialect::Lagrange => FolderRequestShape {
                name_field: "name",
                parent_id: Some("/"),
            },
        }
    }

    /// Build the body for `create_group_file_folder`
    pub fn folder_creation_body(self, group_id: &str, folder_name: &str) -> Value {
        let shape = self.folder_request_shape();

        let mut body = Map::new();
        body.insert("group_id".to_string(), json!(group_id));
        body.insert(shape.name_field.to_string(), json!(folder_name));
        if let Some(parent_id) = shape.parent_id {
            body.insert("parent_id".to_string(), json!(parent_id));
        }

        Value::Object(body)
    }
}

impl FromStr for PlatformDialect {
    type Err = AppError;

    fn from_str(platform: &str) -> AppResult<Self> {
        PlatformDialect::ALL
            .into_iter()
            .find(|dialect| dialect.identifier() == platform)
            .ok_or_else(|| AppError::unsupported_dialect(platform))
    }
}

impl fmt::Display for PlatformDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.identifier())
    }
}
