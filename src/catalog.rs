use serde::ser::{Serialize, SerializeMap, Serializer};

/// Static list of cloud services and the resource types each one offers.
#[derive(Debug, Clone)]
pub struct ResourceCatalog {
    entries: Vec<(String, Vec<String>)>,
}

impl ResourceCatalog {
    pub fn standard() -> Self {
        let entries: [(&str, &[&str]); 5] = [
            ("Compute", &["VM Instances", "Kubernetes Clusters", "Cloud Run"]),
            ("Storage", &["Cloud Storage", "Filestore", "Bigtable"]),
            ("Database", &["Cloud SQL", "Firestore", "Spanner"]),
            ("Networking", &["VPC Networks", "Load Balancers", "Cloud DNS"]),
            ("Security", &["IAM Roles", "Firewall Rules"]),
        ];

        Self {
            entries: entries
                .iter()
                .map(|(service, types)| {
                    (
                        service.to_string(),
                        types.iter().map(|t| t.to_string()).collect(),
                    )
                })
                .collect(),
        }
    }

    pub fn services(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(service, _)| service.as_str())
    }

    pub fn service_count(&self) -> usize {
        self.entries.len()
    }

    pub fn service_at(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|(service, _)| service.as_str())
    }

    pub fn types_for(&self, service: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(name, _)| name == service)
            .map(|(_, types)| types.as_slice())
    }
}

impl Default for ResourceCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

struct ResourceTypes<'a>(&'a [(String, Vec<String>)]);

impl Serialize for ResourceTypes<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (service, types) in self.0 {
            map.serialize_entry(service, types)?;
        }
        map.end()
    }
}

// Services keep catalog order in the JSON output.
impl Serialize for ResourceCatalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("services", &self.services().collect::<Vec<_>>())?;
        map.serialize_entry("resourceTypes", &ResourceTypes(&self.entries))?;
        map.end()
    }
}
