//! Manifest generator
//!
//! Describes the package payload: exactly one manuscript item plus one item
//! per supporting file, in archive order. The manifest is generated from the
//! final entry list, so its hrefs always match the names the archive really
//! carries.

use quick_xml::events::BytesStart;

use crate::error::ExportError;
use crate::export::xml::{document_writer, empty, end, start};
use crate::export::{EntryKind, PackageEntry};

pub fn generate_manifest(entries: &[PackageEntry]) -> Result<Vec<u8>, ExportError> {
    let manuscripts = entries
        .iter()
        .filter(|e| e.kind == EntryKind::Manuscript)
        .count();
    if manuscripts == 0 {
        return Err(ExportError::NoManuscriptFile);
    }
    if manuscripts > 1 {
        return Err(ExportError::MultipleManuscriptFiles);
    }

    let mut writer = document_writer()?;
    let mut manifest = BytesStart::new("manifest");
    manifest.push_attribute(("version", "1.0"));
    start(&mut writer, manifest)?;

    for entry in entries {
        let item_type = match entry.kind {
            EntryKind::Manuscript => "manuscript",
            EntryKind::Supporting => "supporting-file",
            _ => continue,
        };
        let mut item = BytesStart::new("item");
        item.push_attribute(("type", item_type));
        start(&mut writer, item)?;
        let mut instance = BytesStart::new("instance");
        instance.push_attribute(("href", entry.name.as_str()));
        instance.push_attribute(("media-type", entry.mime_type.as_str()));
        empty(&mut writer, instance)?;
        end(&mut writer, "item")?;
    }

    end(&mut writer, "manifest")?;
    Ok(writer.into_inner())
}
