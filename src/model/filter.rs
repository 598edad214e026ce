use crate::model::wire::ServiceInfo;
use crate::model::ResourceType;
use crate::ConfigError;
use bitflags::bitflags;

bitflags! {
    /// Inclusion flags applied while crawling a catalog.
    ///
    /// Service-selecting flags combine as a union: a service is kept when
    /// any set flag admits it. An empty filter keeps everything.
    ///
    /// # Example
    ///
    /// ```
    /// use catalog_ripple::{Filter, ResourceType};
    ///
    /// let filter = Filter::IMAGE_SERVICES | Filter::GEOPROCESSING_SERVICES;
    /// assert!(filter.admits_service_type(ResourceType::ImageServer));
    /// assert!(!filter.admits_service_type(ResourceType::MapServer));
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Filter: u32 {
        /// Map and image services that publish a tile cache
        const CACHED_SERVICES = 1 << 0;
        /// Map and feature services
        const FEATURE_SERVICES = 1 << 1;
        /// Image services
        const IMAGE_SERVICES = 1 << 2;
        /// Geoprocessing services
        const GEOPROCESSING_SERVICES = 1 << 3;
        /// Feature services with editing enabled, and their editable layers
        const EDITABLE_LAYERS = 1 << 4;
        /// Layers with geometry (tables are dropped)
        const SPATIAL_LAYERS = 1 << 5;
    }
}

/// Flags that decide which service types are kept
const SERVICE_FLAGS: Filter = Filter::CACHED_SERVICES
    .union(Filter::FEATURE_SERVICES)
    .union(Filter::IMAGE_SERVICES)
    .union(Filter::GEOPROCESSING_SERVICES)
    .union(Filter::EDITABLE_LAYERS);

/// Flag names accepted in configuration files and on the command line
const FLAG_NAMES: &[(&str, Filter)] = &[
    ("cached-services", Filter::CACHED_SERVICES),
    ("feature-services", Filter::FEATURE_SERVICES),
    ("image-services", Filter::IMAGE_SERVICES),
    ("geoprocessing-services", Filter::GEOPROCESSING_SERVICES),
    ("editable-layers", Filter::EDITABLE_LAYERS),
    ("spatial-layers", Filter::SPATIAL_LAYERS),
];

impl Filter {
    /// Builds a filter from kebab-case flag names
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, ConfigError> {
        let mut filter = Filter::empty();
        for name in names {
            let name = name.as_ref().trim();
            let flag = FLAG_NAMES
                .iter()
                .find(|(known, _)| known.eq_ignore_ascii_case(name))
                .map(|(_, flag)| *flag)
                .ok_or_else(|| {
                    ConfigError::Validation(format!(
                        "Unknown filter '{}' (expected one of: {})",
                        name,
                        FLAG_NAMES
                            .iter()
                            .map(|(n, _)| *n)
                            .collect::<Vec<_>>()
                            .join(", ")
                    ))
                })?;
            filter |= flag;
        }
        Ok(filter)
    }

    /// Kebab-case names of the set flags
    pub fn names(&self) -> Vec<&'static str> {
        FLAG_NAMES
            .iter()
            .filter(|(_, flag)| self.contains(*flag))
            .map(|(name, _)| *name)
            .collect()
    }

    /// Cheap check: could a service of this type pass at all?
    ///
    /// Needs no network call. Services rejected here are never probed.
    pub fn admits_service_type(&self, resource_type: ResourceType) -> bool {
        if !self.intersects(SERVICE_FLAGS) {
            return true;
        }
        (self.contains(Filter::CACHED_SERVICES) && is_cacheable(resource_type))
            || self.admitted_by_type_alone(resource_type)
            || (self.contains(Filter::EDITABLE_LAYERS)
                && resource_type == ResourceType::FeatureServer)
    }

    /// Returns true if deciding on this service type requires its service info
    pub fn needs_service_info(&self, resource_type: ResourceType) -> bool {
        self.intersects(SERVICE_FLAGS)
            && self.admits_service_type(resource_type)
            && !self.admitted_by_type_alone(resource_type)
    }

    /// Full check of a service against its fetched description
    pub fn admits_service(&self, resource_type: ResourceType, info: &ServiceInfo) -> bool {
        if !self.intersects(SERVICE_FLAGS) || self.admitted_by_type_alone(resource_type) {
            return true;
        }
        (self.contains(Filter::CACHED_SERVICES) && is_cacheable(resource_type) && info.is_cached())
            || (self.contains(Filter::EDITABLE_LAYERS)
                && resource_type == ResourceType::FeatureServer
                && info.is_editable())
    }

    /// Checks a layer-level resource
    ///
    /// * `is_spatial` - `Some(false)` for tables and geometry-less layers,
    ///   `None` when unknown
    pub fn admits_layer(&self, resource_type: ResourceType, is_spatial: Option<bool>) -> bool {
        if self.contains(Filter::SPATIAL_LAYERS)
            && resource_type != ResourceType::GroupLayer
            && is_spatial == Some(false)
        {
            return false;
        }
        if self.contains(Filter::EDITABLE_LAYERS) && resource_type == ResourceType::Layer {
            return false;
        }
        true
    }

    /// Type-only flags that admit the service without further information
    fn admitted_by_type_alone(&self, resource_type: ResourceType) -> bool {
        (self.contains(Filter::FEATURE_SERVICES)
            && matches!(
                resource_type,
                ResourceType::MapServer | ResourceType::FeatureServer
            ))
            || (self.contains(Filter::IMAGE_SERVICES) && resource_type == ResourceType::ImageServer)
            || (self.contains(Filter::GEOPROCESSING_SERVICES)
                && resource_type == ResourceType::GPServer)
    }
}

fn is_cacheable(resource_type: ResourceType) -> bool {
    matches!(
        resource_type,
        ResourceType::MapServer | ResourceType::ImageServer
    )
}
