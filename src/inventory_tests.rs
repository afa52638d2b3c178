// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `inventory.rs`

#[cfg(test)]
mod tests {
    use crate::inventory::{Coordinates, Site, SiteCapacity};
    use std::collections::BTreeMap;

    fn edge_site() -> Site {
        let mut labels = BTreeMap::new();
        labels.insert("mano.oran.io/cluster".to_string(), "edge01-tokyo".to_string());
        labels.insert(
            "topology.kubernetes.io/region".to_string(),
            "ap-northeast".to_string(),
        );
        labels.insert(
            "topology.kubernetes.io/zone".to_string(),
            "ap-northeast-1a".to_string(),
        );

        Site {
            id: "site-tokyo-01".to_string(),
            name: "Tokyo Edge 01".to_string(),
            cloud_type: "edge".to_string(),
            coordinates: Coordinates {
                latitude: 35.68,
                longitude: 139.77,
            },
            capacity: SiteCapacity {
                cpu_cores: 64.0,
                memory_gb: 256.0,
                storage_gb: 2000.0,
                bandwidth_mbps: 10_000.0,
            },
            latency_class_ms: 1.0,
            labels,
        }
    }

    #[test]
    fn test_site_label_accessors() {
        let site = edge_site();
        assert_eq!(site.cluster(), Some("edge01-tokyo"));
        assert_eq!(site.region(), Some("ap-northeast"));
        assert_eq!(site.zone(), Some("ap-northeast-1a"));
    }

    #[test]
    fn test_site_without_cluster_label() {
        let mut site = edge_site();
        site.labels.clear();
        assert_eq!(site.cluster(), None);
        assert_eq!(site.region(), None);
        assert_eq!(site.zone(), None);
    }

    #[test]
    fn test_site_deserializes_inventory_wire_format() {
        let json = r#"{
            "id": "site-osaka-02",
            "name": "Osaka Regional 02",
            "cloudType": "regional",
            "coordinates": {"latitude": 34.69, "longitude": 135.5},
            "capacity": {"cpuCores": 128, "memoryGb": 512, "storageGb": 8000, "bandwidthMbps": 40000},
            "latencyClassMs": 5.0,
            "labels": {"mano.oran.io/cluster": "regional01-osaka"}
        }"#;

        let site: Site = serde_json::from_str(json).unwrap();
        assert_eq!(site.id, "site-osaka-02");
        assert_eq!(site.cloud_type, "regional");
        assert!((site.capacity.cpu_cores - 128.0).abs() < f64::EPSILON);
        assert_eq!(site.cluster(), Some("regional01-osaka"));
    }

    #[test]
    fn test_labels_default_to_empty() {
        let json = r#"{
            "id": "s", "name": "s", "cloudType": "central",
            "coordinates": {"latitude": 0, "longitude": 0},
            "capacity": {"cpuCores": 1, "memoryGb": 1, "storageGb": 1, "bandwidthMbps": 1},
            "latencyClassMs": 50.0
        }"#;
        let site: Site = serde_json::from_str(json).unwrap();
        assert!(site.labels.is_empty());
    }
}
