//! 目录文件加载
//!
//! 目录是目录条目的 JSON 数组，缺省字段取默认值。

use crate::error::FileError;
use roomquote_core::catalog::CatalogEntry;
use std::path::Path;

/// 解析目录 JSON
pub fn parse_catalog(json: &str) -> Result<Vec<CatalogEntry>, FileError> {
    let entries: Vec<CatalogEntry> = serde_json::from_str(json)?;
    for entry in &entries {
        if entry.name.trim().is_empty() {
            return Err(FileError::InvalidFormat(
                "Catalog entry without a name".to_string(),
            ));
        }
        if !(entry.width.is_finite() && entry.depth.is_finite() && entry.unit_price.is_finite()) {
            return Err(FileError::InvalidFormat(format!(
                "Catalog entry '{}' has non-numeric fields",
                entry.name
            )));
        }
    }
    Ok(entries)
}

/// 从文件加载目录
pub fn load_catalog(path: &Path) -> Result<Vec<CatalogEntry>, FileError> {
    let json = std::fs::read_to_string(path)?;
    let entries = parse_catalog(&json)?;
    tracing::info!("Loaded {} catalog entries from {}", entries.len(), path.display());
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use roomquote_core::catalog::{Adjustable, PricingType};

    #[test]
    fn test_parse_catalog() {
        let json = r#"[
            {"name": "系統衣櫃", "width": 120, "depth": 60, "unitPrice": 9000,
             "pricingType": "width", "adjustable": "width", "group": "系統櫃"},
            {"name": "崁燈", "unitPrice": 450, "pricingType": "number", "allowOverlap": true}
        ]"#;
        let entries = parse_catalog(json).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].pricing_type, PricingType::Width);
        assert_eq!(entries[0].adjustable, Adjustable::Width);
        assert!(entries[1].allow_overlap);
        assert_eq!(entries[1].default_opacity, 1.0);
    }

    #[test]
    fn test_unnamed_entry_rejected() {
        let json = r#"[{"name": "  ", "unitPrice": 1}]"#;
        assert!(matches!(parse_catalog(json), Err(FileError::InvalidFormat(_))));
    }
}
