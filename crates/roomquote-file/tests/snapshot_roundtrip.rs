//! 快照与自动存档往返测试

use roomquote_core::prelude::*;
use roomquote_core::region::build_region;
use roomquote_file::{native, snapshot};

fn furnished_room(config: &LayoutConfig) -> LayoutDocument {
    let mut doc = LayoutDocument::new();

    let wardrobe = CatalogEntry::new("系統衣櫃", 120.0, 60.0, 3000.0)
        .with_pricing(PricingType::Width)
        .with_group("系統櫃")
        .with_addon("抽屜", "個", 800.0);
    let id = doc.add_item(wardrobe, 0.0, 0.0, config);
    doc.item_mut(id).unwrap().set_addon_qty(0, 2.0);

    let ring = vec![
        Point2::new(0.0, 0.0),
        Point2::new(400.0, 0.0),
        Point2::new(400.0, 300.0),
        Point2::new(0.0, 300.0),
    ];
    let mut floor = build_region(RegionKind::Floor, ring.clone(), None, config).unwrap();
    floor.linked_component = Some(LinkedComponent::new("超耐磨木地板", 5000.0, "地板工程"));
    doc.add_region(floor);
    doc.add_region(build_region(RegionKind::Wall, ring, Some(15.0), config).unwrap());

    let data = AnnotationData {
        name: "全室清潔".to_string(),
        unit_price: 6000.0,
        pricing_type: PricingType::Fixed,
        group: "清潔工程".to_string(),
    };
    doc.add_annotation(data, Point2::new(500.0, 50.0), Point2::new(200.0, 150.0));
    doc.construction_area = 12.0;
    doc
}

#[test]
fn test_json_file_roundtrip_preserves_quotation() {
    let config = LayoutConfig::default();
    let doc = furnished_room(&config);
    let path = std::env::temp_dir().join("roomquote_roundtrip_test.json");

    snapshot::save(&doc, &path).expect("Failed to save");
    let loaded = snapshot::load(&path, &config).expect("Failed to load");

    assert_eq!(loaded.state(), doc.state());
    assert_eq!(loaded.construction_area, 12.0);
    assert_eq!(
        calculate_full_quotation(&loaded, &config),
        calculate_full_quotation(&doc, &config)
    );

    std::fs::remove_file(&path).ok();
}

#[test]
fn test_loaded_document_allocates_fresh_ids() {
    let config = LayoutConfig::default();
    let doc = furnished_room(&config);
    let json = snapshot::to_json(&doc).unwrap();

    let mut loaded = snapshot::from_json(&json, &config).unwrap();
    let new_id = loaded.add_item(CatalogEntry::new("邊櫃", 40.0, 40.0, 100.0), 600.0, 600.0, &config);

    let existing: Vec<EntityId> = doc
        .items
        .iter()
        .map(|i| i.id)
        .chain(doc.regions.iter().map(|r| r.id))
        .chain(doc.annotations.iter().map(|a| a.id))
        .collect();
    assert!(!existing.contains(&new_id));
}

#[test]
fn test_autosave_matches_json_content() {
    let config = LayoutConfig::default();
    let doc = furnished_room(&config);

    let bytes = native::encode(&doc).unwrap();
    let restored = native::decode(bytes.as_slice(), &config).unwrap();
    assert_eq!(restored.state(), doc.state());
}
