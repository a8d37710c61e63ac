//! Declared input features of the delivery time model
//!
//! Order matters: it is the column order the model was fit on.

use super::schema::{Bounds, DeclaredKind, FeatureDecl};

/// Feature declarations in model training order
pub const DELIVERY_FEATURES: &[FeatureDecl] = &[
    FeatureDecl {
        name: "age",
        kind: DeclaredKind::Numeric(Some(Bounds::new(20.0, 50.0))),
    },
    FeatureDecl {
        name: "ratings",
        kind: DeclaredKind::Numeric(Some(Bounds::new(0.0, 5.0))),
    },
    FeatureDecl {
        name: "weather",
        kind: DeclaredKind::Categorical,
    },
    FeatureDecl {
        name: "traffic",
        kind: DeclaredKind::Categorical,
    },
    FeatureDecl {
        name: "vehicle_condition",
        kind: DeclaredKind::Categorical,
    },
    FeatureDecl {
        name: "type_of_vehicle",
        kind: DeclaredKind::Categorical,
    },
    FeatureDecl {
        name: "multiple_deliveries",
        kind: DeclaredKind::Categorical,
    },
    FeatureDecl {
        name: "festival",
        kind: DeclaredKind::BooleanLike,
    },
    FeatureDecl {
        name: "city_name",
        kind: DeclaredKind::Categorical,
    },
    FeatureDecl {
        name: "is_weekend",
        kind: DeclaredKind::BooleanLike,
    },
    FeatureDecl {
        name: "pickup_time_minutes",
        kind: DeclaredKind::Numeric(None),
    },
    FeatureDecl {
        name: "order_time_hour",
        kind: DeclaredKind::Numeric(Some(Bounds::new(0.0, 24.0))),
    },
    FeatureDecl {
        name: "distance",
        kind: DeclaredKind::Numeric(None),
    },
];

/// Human-readable prompt for a feature, falling back to its name
pub fn prompt_for(name: &str) -> &str {
    match name {
        "age" => "Rider age",
        "ratings" => "Rider rating",
        "weather" => "Weather condition",
        "traffic" => "Traffic condition",
        "vehicle_condition" => "Vehicle condition",
        "type_of_vehicle" => "Type of vehicle",
        "multiple_deliveries" => "Multiple deliveries",
        "festival" => "Is it a festival",
        "city_name" => "City",
        "is_weekend" => "Is it the weekend",
        "pickup_time_minutes" => "Pickup time (minutes)",
        "order_time_hour" => "Order hour",
        "distance" => "Distance between restaurant and delivery location",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ReferenceDataset;
    use crate::features::{FeatureKind, SchemaRegistry};
    use crate::DeliveryError;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_is_unique() {
        let names: HashSet<_> = DELIVERY_FEATURES.iter().map(|d| d.name).collect();
        assert_eq!(names.len(), DELIVERY_FEATURES.len());
        assert_eq!(DELIVERY_FEATURES.len(), 13);
    }

    #[test]
    fn test_catalog_order() {
        let names: Vec<_> = DELIVERY_FEATURES.iter().map(|d| d.name).collect();
        assert_eq!(
            names,
            vec![
                "age",
                "ratings",
                "weather",
                "traffic",
                "vehicle_condition",
                "type_of_vehicle",
                "multiple_deliveries",
                "festival",
                "city_name",
                "is_weekend",
                "pickup_time_minutes",
                "order_time_hour",
                "distance",
            ]
        );
    }

    // Columns deliberately out of model order, with the label in the middle
    const DELIVERIES: &str = "\
city_name,age,ratings,time_taken,weather,traffic,vehicle_condition,type_of_vehicle,multiple_deliveries,festival,is_weekend,pickup_time_minutes,order_time_hour,distance
Metropolitian,37,4.9,24,Sunny,High,2,motorcycle,0,No,1,15,11,3.02
Urban,34,4.5,33,Stormy,Jam,2,scooter,1,No,0,5,19,20.14
Metropolitian,23,4.4,26,Sandstorms,Low,0,motorcycle,1,Yes,0,15,8,1.55
Urban,38,4.7,21,Sunny,Medium,1,scooter,1,No,1,10,18,7.79
Semi-Urban,32,4.6,,Fog,Jam,1,motorcycle,3,No,0,10,21,12.3
Metropolitian,22,4.8,30,NaN,Low,0,electric_scooter,0,No,1,5,13,6.1
";

    #[test]
    fn test_registry_from_delivery_dataset() {
        let ds = ReferenceDataset::from_reader(DELIVERIES.as_bytes()).unwrap();
        assert_eq!(ds.dropped_rows(), 2);

        let reg = SchemaRegistry::from_dataset(DELIVERY_FEATURES, &ds, Some("time_taken")).unwrap();
        let expected: Vec<_> = DELIVERY_FEATURES.iter().map(|d| d.name).collect();
        assert_eq!(reg.names(), expected);

        assert!(matches!(
            reg.feature("festival").unwrap().kind,
            FeatureKind::BooleanLike { .. }
        ));
        assert!(matches!(
            reg.feature("is_weekend").unwrap().kind,
            FeatureKind::BooleanLike { .. }
        ));
        assert_eq!(reg.domain_of("festival").unwrap(), &["No", "Yes"]);
        assert_eq!(reg.domain_of("is_weekend").unwrap(), &["1", "0"]);

        assert_eq!(
            reg.domain_of("weather").unwrap(),
            &["Sunny", "Stormy", "Sandstorms"]
        );
        assert_eq!(
            reg.domain_of("traffic").unwrap(),
            &["High", "Jam", "Low", "Medium"]
        );
        assert_eq!(reg.domain_of("vehicle_condition").unwrap(), &["2", "0", "1"]);
        assert_eq!(reg.domain_of("type_of_vehicle").unwrap(), &["motorcycle", "scooter"]);
        assert_eq!(reg.domain_of("multiple_deliveries").unwrap(), &["0", "1"]);
        assert_eq!(reg.domain_of("city_name").unwrap(), &["Metropolitian", "Urban"]);

        assert_eq!(
            reg.feature("age").unwrap().bounds(),
            Some(Bounds::new(20.0, 50.0))
        );
        assert_eq!(
            reg.feature("order_time_hour").unwrap().bounds(),
            Some(Bounds::new(0.0, 24.0))
        );
        assert_eq!(reg.feature("distance").unwrap().bounds(), None);
        assert!(matches!(
            reg.domain_of("pickup_time_minutes"),
            Err(DeliveryError::NotCategorical(_))
        ));
    }

    #[test]
    fn test_every_feature_has_prompt() {
        for decl in DELIVERY_FEATURES {
            assert_ne!(prompt_for(decl.name), decl.name);
        }
    }
}
