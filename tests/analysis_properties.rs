use shelf_layout::config::ThresholdStrategy;
use shelf_layout::layout::ClassificationPolicy;
use shelf_layout::{
    analyze, AnalysisConfig, AnalysisError, AnalysisRequest, ColumnLabel, ColumnSide, LayoutType,
    RawDetection,
};

fn request(width: i64, height: i64, detections: Vec<RawDetection>) -> AnalysisRequest {
    AnalysisRequest {
        image_width: width,
        image_height: height,
        detections,
    }
}

fn boxed(name: &str, cx: f64, cy: f64, half: f64) -> RawDetection {
    RawDetection::new(name, 0.8, [cx - half, cy - half, cx + half, cy + half])
}

fn shelf_scene() -> Vec<RawDetection> {
    vec![
        boxed("bottle", 80.0, 60.0, 20.0),
        boxed("bottle", 120.0, 64.0, 20.0),
        boxed("can", 320.0, 250.0, 15.0),
        boxed("can", 360.0, 255.0, 15.0),
        boxed("person", 560.0, 420.0, 30.0),
        boxed("cup", 300.0, 410.0, 10.0),
    ]
}

#[test]
fn total_objects_counts_survivors_only() -> anyhow::Result<()> {
    let mut dets = shelf_scene();
    dets.push(RawDetection::new("bottle", 0.9, [100.0, 50.0, 60.0, 50.0]));
    dets.push(RawDetection::new("", 0.9, [0.0, 0.0, 10.0, 10.0]));
    let report = analyze(&request(640, 480, dets), &AnalysisConfig::default())?;
    assert_eq!(report.total_objects, 6);
    assert_eq!(report.dropped.malformed, 2);
    assert_eq!(report.positioning_details.len(), 6);
    assert_eq!(report.class_distribution.values().sum::<usize>(), 6);
    assert!(report.detection_summary.starts_with("Found 6 objects"));
    Ok(())
}

#[test]
fn inverted_box_is_excluded_everywhere() -> anyhow::Result<()> {
    let dets = vec![
        RawDetection::new("bottle", 0.9, [100.0, 50.0, 60.0, 50.0]),
        boxed("can", 320.0, 240.0, 10.0),
    ];
    let report = analyze(&request(640, 480, dets), &AnalysisConfig::default())?;
    assert_eq!(report.total_objects, 1);
    assert_eq!(report.class_distribution.get("bottle"), None);
    assert_eq!(report.estimated_rows, 1);
    assert_eq!(report.estimated_columns, 1);
    assert!(report
        .positioning_details
        .iter()
        .all(|p| p.class_name == "can"));
    Ok(())
}

#[test]
fn clustering_ignores_input_order() -> anyhow::Result<()> {
    let cfg = AnalysisConfig::default();
    let forward = analyze(&request(640, 480, shelf_scene()), &cfg)?;
    let mut shuffled = shelf_scene();
    shuffled.reverse();
    shuffled.swap(0, 3);
    let permuted = analyze(&request(640, 480, shuffled), &cfg)?;

    assert_eq!(forward.estimated_rows, permuted.estimated_rows);
    assert_eq!(forward.estimated_columns, permuted.estimated_columns);
    assert_eq!(forward.density, permuted.density);
    assert_eq!(forward.class_distribution, permuted.class_distribution);
    assert_eq!(forward.layout_type, permuted.layout_type);
    Ok(())
}

#[test]
fn clustering_is_scale_consistent() -> anyhow::Result<()> {
    for strategy in [ThresholdStrategy::Fixed, ThresholdStrategy::Statistical] {
        let mut cfg = AnalysisConfig::default();
        cfg.rows.strategy = strategy;
        cfg.columns.strategy = strategy;

        let base = analyze(&request(640, 480, shelf_scene()), &cfg)?;
        let scaled_dets = shelf_scene()
            .into_iter()
            .map(|d| {
                RawDetection::new(
                    d.class_name,
                    d.confidence,
                    [d.x_min * 2.0, d.y_min * 2.0, d.x_max * 2.0, d.y_max * 2.0],
                )
            })
            .collect();
        let scaled = analyze(&request(1280, 960, scaled_dets), &cfg)?;
        assert_eq!(base.estimated_rows, scaled.estimated_rows);
        assert_eq!(base.estimated_columns, scaled.estimated_columns);
        assert_eq!(base.density, scaled.density);
    }
    Ok(())
}

#[test]
fn density_is_bounded_below_and_repeatable() -> anyhow::Result<()> {
    let cfg = AnalysisConfig::default();
    let req = request(640, 480, shelf_scene());
    let a = analyze(&req, &cfg)?;
    let b = analyze(&req, &cfg)?;
    assert!(a.density >= 0.0);
    assert_eq!(a.density.to_bits(), b.density.to_bits());
    assert_eq!(a, b);
    Ok(())
}

#[test]
fn zero_detections_give_empty_report() -> anyhow::Result<()> {
    let report = analyze(&request(640, 480, Vec::new()), &AnalysisConfig::default())?;
    assert_eq!(report.total_objects, 0);
    assert_eq!(report.estimated_rows, 0);
    assert_eq!(report.estimated_columns, 0);
    assert_eq!(report.layout_type, LayoutType::Empty);
    assert!(report.positioning_details.is_empty());
    assert_eq!(report.shelf_organization.narrative, "No objects to analyze");
    Ok(())
}

#[test]
fn all_rejected_is_still_an_empty_report() -> anyhow::Result<()> {
    let dets = vec![RawDetection::new("can", 0.5, [10.0, 10.0, 5.0, 20.0])];
    let report = analyze(&request(640, 480, dets), &AnalysisConfig::default())?;
    assert_eq!(report.total_objects, 0);
    assert_eq!(report.dropped.malformed, 1);
    assert_eq!(report.layout_type, LayoutType::Empty);
    Ok(())
}

#[test]
fn single_detection_is_one_row_one_column() -> anyhow::Result<()> {
    let dets = vec![boxed("bottle", 100.0, 100.0, 10.0)];
    let report = analyze(&request(640, 480, dets), &AnalysisConfig::default())?;
    assert_eq!(report.estimated_rows, 1);
    assert_eq!(report.estimated_columns, 1);
    assert_eq!(report.positioning_details[0].row, 1);
    assert_eq!(
        report.positioning_details[0].column,
        ColumnLabel::Side(ColumnSide::Left)
    );
    assert_eq!(
        report.positioning_details[0].description,
        "bottle on shelf 1, left side"
    );
    Ok(())
}

#[test]
fn fixed_row_threshold_worked_example() -> anyhow::Result<()> {
    // normalized center_y 0.05, 0.08, 0.55, 0.58, 0.95 on a 480px frame
    let dets = [0.05, 0.08, 0.55, 0.58, 0.95]
        .iter()
        .map(|ny| boxed("bottle", 320.0, ny * 480.0, 5.0))
        .collect();
    let report = analyze(&request(640, 480, dets), &AnalysisConfig::default())?;
    assert_eq!(report.estimated_rows, 3);
    assert_eq!(report.estimated_columns, 1);
    Ok(())
}

#[test]
fn statistical_row_threshold_on_same_example() -> anyhow::Result<()> {
    let dets = [0.05, 0.08, 0.55, 0.58, 0.95]
        .iter()
        .map(|ny| boxed("bottle", 320.0, ny * 480.0, 5.0))
        .collect();
    let mut cfg = AnalysisConfig::default();
    cfg.rows.strategy = ThresholdStrategy::Statistical;
    let report = analyze(&request(640, 480, dets), &cfg)?;
    assert_eq!(report.estimated_rows, 2);
    Ok(())
}

#[test]
fn count_outranks_density_under_occupancy_policy() -> anyhow::Result<()> {
    // 25 boxes of 64 x 76.8 px on a 5x5 grid: 40% of a 640x480 frame.
    let mut dets = Vec::new();
    for row in 0..5 {
        for col in 0..5 {
            let x = f64::from(col) * 128.0;
            let y = f64::from(row) * 96.0;
            dets.push(RawDetection::new("widget", 0.9, [x, y, x + 64.0, y + 76.8]));
        }
    }
    let mut cfg = AnalysisConfig::default();
    cfg.classification.policy = ClassificationPolicy::Occupancy;
    cfg.classification.dense_density = 0.9;

    let report = analyze(&request(640, 480, dets), &cfg)?;
    assert_eq!(report.total_objects, 25);
    assert_eq!(report.density, 0.4);
    assert_eq!(report.layout_type, LayoutType::Dense);
    assert_eq!(report.estimated_rows, 5);
    assert_eq!(report.estimated_columns, 5);
    Ok(())
}

#[test]
fn invalid_frame_is_distinct_from_empty() {
    let err = analyze(&request(0, 480, Vec::new()), &AnalysisConfig::default()).unwrap_err();
    assert_eq!(
        err,
        AnalysisError::InvalidFrame {
            width: 0,
            height: 480
        }
    );
    assert!(analyze(&request(640, -5, shelf_scene()), &AnalysisConfig::default()).is_err());
}

#[test]
fn invalid_config_is_reported() {
    let mut cfg = AnalysisConfig::default();
    cfg.assignment.shelf_bands = 0;
    let err = analyze(&request(640, 480, shelf_scene()), &cfg).unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidConfig(_)));
}

#[test]
fn report_serializes_with_snake_case_labels() -> anyhow::Result<()> {
    let report = analyze(&request(640, 480, shelf_scene()), &AnalysisConfig::default())?;
    let value = serde_json::to_value(&report)?;
    assert_eq!(value["total_objects"], 6);
    assert_eq!(value["layout_type"], "category_dominant");
    assert_eq!(value["stock_level"], "low");
    assert_eq!(value["positioning_details"][0]["column"], "left");
    assert_eq!(value["image_dimensions"]["width"], 640);
    assert!(value["shelf_organization"]["narrative"].is_string());

    let decoded: shelf_layout::AnalysisReport = serde_json::from_value(value)?;
    assert_eq!(decoded.total_objects, report.total_objects);
    assert_eq!(decoded.positioning_details.len(), 6);
    assert_eq!(decoded.layout_type, LayoutType::CategoryDominant);
    Ok(())
}

#[test]
fn normalized_fields_stay_in_unit_range_and_json_reads_back() -> anyhow::Result<()> {
    let dets = vec![
        RawDetection::new("bottle", 0.9, [700.0, 10.0, 800.0, 50.0]),
        RawDetection::new("shelf", 0.9, [-1e308, 0.0, 1e308, 50.0]),
        RawDetection::new("can", 0.9, [600.0, 440.0, 700.0, 500.0]),
        boxed("cup", 100.0, 100.0, 10.0),
    ];
    let report = analyze(&request(640, 480, dets), &AnalysisConfig::default())?;
    assert_eq!(report.total_objects, 2);
    assert_eq!(report.dropped.malformed, 2);
    assert!(report.density.is_finite() && report.density <= 1.0);
    assert_eq!(report.positioning_details[0].x_max, 640.0);
    assert_eq!(
        report.positioning_details[0].column,
        ColumnLabel::Side(ColumnSide::Right)
    );

    let json = serde_json::to_string(&report)?;
    assert!(!json.contains("null"));
    let decoded: shelf_layout::AnalysisReport = serde_json::from_str(&json)?;
    assert_eq!(decoded.total_objects, 2);
    Ok(())
}

#[test]
fn recommendations_follow_object_count() -> anyhow::Result<()> {
    let report = analyze(&request(640, 480, shelf_scene()), &AnalysisConfig::default())?;
    assert_eq!(
        report.recommendations,
        vec![
            "Low product density - opportunity to add more products",
            "Consider adding more products to optimize space utilization",
        ]
    );
    Ok(())
}
