//! JSON shapes returned by the REST endpoints
//!
//! Only the members the crawler reads are modelled; unknown members are
//! ignored. Array members tolerate both absence and an explicit `null`.

use serde::{Deserialize, Deserializer};

fn null_to_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Services directory or folder listing
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    #[serde(default)]
    pub current_version: Option<f64>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub folders: Vec<String>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub services: Vec<ServiceEntry>,
}

/// One service entry of a catalog; `name` includes the folder prefix
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub service_type: String,
}

/// Service root description (MapServer, FeatureServer, ImageServer, GPServer)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfo {
    #[serde(default)]
    pub current_version: Option<f64>,
    #[serde(default)]
    pub service_description: Option<String>,
    #[serde(default)]
    pub map_name: Option<String>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub layers: Vec<LayerEntry>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub tables: Vec<LayerEntry>,
    #[serde(default)]
    pub single_fused_map_cache: Option<bool>,
    #[serde(default)]
    pub tile_info: Option<serde_json::Value>,
    #[serde(default)]
    pub capabilities: Option<String>,
    #[serde(default)]
    pub spatial_reference: Option<SpatialReference>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub tasks: Vec<String>,
}

impl ServiceInfo {
    /// Returns true if the service publishes a tile cache
    pub fn is_cached(&self) -> bool {
        self.single_fused_map_cache.unwrap_or(false) || self.tile_info.is_some()
    }

    /// Returns true if the service capabilities allow editing
    pub fn is_editable(&self) -> bool {
        capabilities_allow_editing(self.capabilities.as_deref())
    }
}

/// Layer or table entry inside a service description
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerEntry {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub parent_layer_id: Option<i64>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub sub_layer_ids: Vec<i64>,
    #[serde(default)]
    pub geometry_type: Option<String>,
    #[serde(default, rename = "type")]
    pub layer_type: Option<String>,
}

impl LayerEntry {
    /// Returns true if the layer sits directly under the service
    pub fn is_top_level(&self) -> bool {
        self.parent_layer_id.map_or(true, |id| id < 0)
    }

    pub fn is_group(&self) -> bool {
        !self.sub_layer_ids.is_empty()
            || self
                .layer_type
                .as_deref()
                .is_some_and(|t| t.eq_ignore_ascii_case("group layer"))
    }
}

/// Layer description (`…/MapServer/<id>`)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerDetails {
    pub id: i64,
    pub name: String,
    #[serde(default, rename = "type")]
    pub layer_type: Option<String>,
    #[serde(default)]
    pub geometry_type: Option<String>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub fields: Vec<FieldInfo>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub sub_layers: Vec<SubLayerRef>,
    #[serde(default)]
    pub capabilities: Option<String>,
}

impl LayerDetails {
    pub fn is_group(&self) -> bool {
        !self.sub_layers.is_empty()
            || self
                .layer_type
                .as_deref()
                .is_some_and(|t| t.eq_ignore_ascii_case("group layer"))
    }

    /// Tables have no geometry
    pub fn is_spatial(&self) -> bool {
        self.geometry_type.is_some()
    }

    pub fn is_editable(&self) -> bool {
        capabilities_allow_editing(self.capabilities.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubLayerRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldInfo {
    pub name: String,
    #[serde(default, rename = "type")]
    pub field_type: Option<String>,
    #[serde(default)]
    pub alias: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpatialReference {
    #[serde(default)]
    pub wkid: Option<i64>,
    #[serde(default)]
    pub latest_wkid: Option<i64>,
    #[serde(default)]
    pub wkt: Option<String>,
}

/// Instance metadata (`…/rest/info`)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceInfo {
    #[serde(default)]
    pub current_version: Option<f64>,
    #[serde(default)]
    pub auth_info: Option<AuthInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthInfo {
    #[serde(default)]
    pub is_token_based_security: bool,
    #[serde(default)]
    pub token_services_url: Option<String>,
}

/// `{"error": {"code": 498, "message": "Invalid token."}}`
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub details: Vec<String>,
}

fn capabilities_allow_editing(capabilities: Option<&str>) -> bool {
    capabilities.is_some_and(|caps| {
        caps.split(',').any(|cap| {
            matches!(
                cap.trim().to_ascii_lowercase().as_str(),
                "create" | "update" | "delete" | "editing"
            )
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_tolerates_null_arrays() {
        let catalog: Catalog =
            serde_json::from_str(r#"{"currentVersion": 10.9, "folders": null, "services": null}"#)
                .unwrap();
        assert!(catalog.folders.is_empty());
        assert!(catalog.services.is_empty());
    }

    #[test]
    fn test_service_info_flags() {
        let info: ServiceInfo = serde_json::from_str(
            r#"{"singleFusedMapCache": true, "capabilities": "Query, Update", "layers": []}"#,
        )
        .unwrap();
        assert!(info.is_cached());
        assert!(info.is_editable());

        let info: ServiceInfo =
            serde_json::from_str(r#"{"capabilities": "Map,Query,Data"}"#).unwrap();
        assert!(!info.is_cached());
        assert!(!info.is_editable());
    }

    #[test]
    fn test_layer_entry_grouping() {
        let layer: LayerEntry = serde_json::from_str(
            r#"{"id": 0, "name": "Transport", "parentLayerId": -1, "subLayerIds": [1, 2]}"#,
        )
        .unwrap();
        assert!(layer.is_top_level());
        assert!(layer.is_group());

        let layer: LayerEntry = serde_json::from_str(
            r#"{"id": 1, "name": "Roads", "parentLayerId": 0, "subLayerIds": null}"#,
        )
        .unwrap();
        assert!(!layer.is_top_level());
        assert!(!layer.is_group());
    }

    #[test]
    fn test_layer_details() {
        let details: LayerDetails = serde_json::from_str(
            r#"{
                "id": 3,
                "name": "Parcels",
                "type": "Feature Layer",
                "geometryType": "esriGeometryPolygon",
                "fields": [{"name": "OBJECTID", "type": "esriFieldTypeOID", "alias": "Object ID"}],
                "subLayers": []
            }"#,
        )
        .unwrap();
        assert!(!details.is_group());
        assert!(details.is_spatial());
        assert_eq!(details.fields.len(), 1);
        assert_eq!(details.fields[0].alias.as_deref(), Some("Object ID"));
    }
}
