//! Default catalog of services and pharmacies.
//!
//! This module provides the built-in services and providers, plus the
//! read-only lookups the booking engine validates against.

use crate::money::Money;
use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

/// Builds the default catalog with the built-in services and pharmacies
///
/// **Note**: For production use, prefer `default_catalog()` which returns a
/// cached reference. This function is retained for tests that need an owned
/// catalog to modify.
pub fn build_default_catalog() -> Catalog {
    // ========================================================================
    // Services
    // ========================================================================

    let services = vec![
        service(
            "1",
            "قياس الضغط",
            "قياس ضغط الدم بدقة في المنزل مع تقرير مفصل",
            50,
            15,
            ServiceCategory::Measurement,
        ),
        service(
            "2",
            "قياس السكر",
            "فحص مستوى السكر في الدم مع متابعة النتائج",
            40,
            10,
            ServiceCategory::Measurement,
        ),
        service(
            "3",
            "إعطاء حقن",
            "حقن طبية آمنة بواسطة متخصصين مؤهلين",
            30,
            5,
            ServiceCategory::Injection,
        ),
        service(
            "4",
            "جلسة بخار للأطفال",
            "جلسات بخار علاجية للأطفال لعلاج مشاكل التنفس",
            60,
            30,
            ServiceCategory::Therapy,
        ),
        service(
            "5",
            "استشارة أولية",
            "تقييم شامل للحالة الصحية مع توصيات العلاج",
            80,
            20,
            ServiceCategory::Consultation,
        ),
    ];

    // ========================================================================
    // Providers
    // ========================================================================

    let providers = vec![
        Provider {
            id: "1".into(),
            name: "صيدلية النور".into(),
            address: "شارع الملك فهد، الرياض".into(),
            distance_km: 1.2,
            rating: 4.8,
            review_count: 127,
            is_available: true,
            estimated_time_label: "15-20 دقيقة".into(),
            serviced_service_ids: ids(&["1", "2", "3", "4", "5"]),
        },
        Provider {
            id: "2".into(),
            name: "صيدلية الشفاء".into(),
            address: "طريق الملك عبدالعزيز، الرياض".into(),
            distance_km: 2.1,
            rating: 4.6,
            review_count: 89,
            is_available: true,
            estimated_time_label: "20-25 دقيقة".into(),
            serviced_service_ids: ids(&["1", "2", "3", "5"]),
        },
        Provider {
            id: "3".into(),
            name: "صيدلية الحياة".into(),
            address: "شارع العليا، الرياض".into(),
            distance_km: 3.5,
            rating: 4.7,
            review_count: 156,
            is_available: false,
            estimated_time_label: "غير متاح".into(),
            serviced_service_ids: ids(&["1", "2", "4", "5"]),
        },
        Provider {
            id: "4".into(),
            name: "صيدلية الأمل".into(),
            address: "حي النخيل، الرياض".into(),
            distance_km: 1.8,
            rating: 4.9,
            review_count: 203,
            is_available: true,
            estimated_time_label: "10-15 دقيقة".into(),
            serviced_service_ids: ids(&["1", "2", "3", "4", "5"]),
        },
    ];

    Catalog {
        services,
        providers,
    }
}

fn service(
    id: &str,
    name: &str,
    description: &str,
    price: i64,
    duration_minutes: u32,
    category: ServiceCategory,
) -> Service {
    Service {
        id: id.into(),
        name: name.into(),
        description: description.into(),
        price: Money::from_major(price),
        duration_minutes,
        category,
    }
}

fn ids(raw: &[&str]) -> Vec<String> {
    raw.iter().map(|s| s.to_string()).collect()
}

impl Catalog {
    pub fn service(&self, id: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.id == id)
    }

    pub fn provider(&self, id: &str) -> Option<&Provider> {
        self.providers.iter().find(|p| p.id == id)
    }

    /// Providers that offer the service and are currently taking bookings
    pub fn available_providers_for(&self, service_id: &str) -> Vec<&Provider> {
        self.providers
            .iter()
            .filter(|p| p.is_available && p.serves(service_id))
            .collect()
    }

    /// Search services by name and optional category
    ///
    /// The term matches case-insensitively anywhere in the name; an empty
    /// term matches every service.
    pub fn search_services(
        &self,
        term: Option<&str>,
        category: Option<ServiceCategory>,
    ) -> Vec<&Service> {
        let needle = term.map(|t| t.trim().to_lowercase()).unwrap_or_default();
        self.services
            .iter()
            .filter(|s| needle.is_empty() || s.name.to_lowercase().contains(&needle))
            .filter(|s| category.map_or(true, |c| s.category == c))
            .collect()
    }

    /// Validate the catalog for consistency and completeness
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let mut seen = HashSet::new();
        for service in &self.services {
            if service.id.is_empty() {
                errors.push("Service has empty ID".to_string());
            }
            if !seen.insert(service.id.as_str()) {
                errors.push(format!("Duplicate service ID '{}'", service.id));
            }
            if service.name.is_empty() {
                errors.push(format!("Service '{}' has empty name", service.id));
            }
            if !service.price.is_positive() {
                errors.push(format!(
                    "Service '{}' has non-positive price {}",
                    service.id, service.price
                ));
            }
            if service.duration_minutes == 0 {
                errors.push(format!("Service '{}' has zero duration", service.id));
            }
        }

        let mut seen = HashSet::new();
        for provider in &self.providers {
            if provider.id.is_empty() {
                errors.push("Provider has empty ID".to_string());
            }
            if !seen.insert(provider.id.as_str()) {
                errors.push(format!("Duplicate provider ID '{}'", provider.id));
            }
            if provider.name.is_empty() {
                errors.push(format!("Provider '{}' has empty name", provider.id));
            }

            // Check that all referenced services exist
            for service_id in &provider.serviced_service_ids {
                if self.service(service_id).is_none() {
                    errors.push(format!(
                        "Provider '{}' references non-existent service '{}'",
                        provider.id, service_id
                    ));
                }
            }
        }

        errors
    }
}
