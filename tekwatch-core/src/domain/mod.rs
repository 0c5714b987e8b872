//! Domain types

pub mod endpoint;
pub mod log;
pub mod pipeline_run;
pub mod task_run;

use serde::{Deserialize, Deserializer, Serialize};

/// Decodes an explicit JSON `null` as the type's default value
///
/// The upstream API emits `null` for empty lists in some versions, which
/// `#[serde(default)]` alone does not cover.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Object metadata shared by every Tekton resource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: std::collections::HashMap<String, String>,
}
