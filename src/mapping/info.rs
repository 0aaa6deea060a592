//! Font-level info
//!
//! Glyphs 3 keeps the naming strings in the root `properties` list, most
//! of them localized. Glyphs 2 keeps them as root keys or custom
//! parameters.

use crate::font_source::{FormatVersion, Package};
use crate::neutral::FontInfo;
use crate::plist::Plist;

/// Preferred languages of a localized property, in order
const LANGUAGES: [&str; 2] = ["dflt", "ENG"];

/// Which name each info field is stored under in Glyphs 3 and Glyphs 2
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NameField {
    Copyright,
    Designer,
    DesignerUrl,
    LicenseDescription,
    Manufacturer,
    ManufacturerUrl,
    Trademark,
    VendorId,
}

impl NameField {
    fn keys(self) -> (&'static str, &'static str) {
        match self {
            NameField::Copyright => ("copyrights", "copyright"),
            NameField::Designer => ("designers", "designer"),
            NameField::DesignerUrl => ("designerURL", "designerURL"),
            NameField::LicenseDescription => ("licenses", "license"),
            NameField::Manufacturer => ("manufacturers", "manufacturer"),
            NameField::ManufacturerUrl => ("manufacturerURL", "manufacturerURL"),
            NameField::Trademark => ("trademarks", "trademark"),
            NameField::VendorId => ("vendorID", "vendorID"),
        }
    }
}

/// The value of a Glyphs 3 property entry
fn property_value(property: &Plist) -> Option<String> {
    if let Some(value) = property.get("value") {
        return value.to_text();
    }
    let values = property.get("values")?.as_array()?;
    fn language<'a>(entry: &&'a Plist) -> Option<&'a str> {
        entry.get("language").and_then(Plist::as_str)
    }
    LANGUAGES
        .iter()
        .find_map(|wanted| values.iter().find(|entry| language(entry) == Some(*wanted)))
        .or_else(|| values.first())
        .and_then(|entry| entry.get("value"))
        .and_then(Plist::to_text)
}

fn read_name(package: &Package, field: NameField) -> Option<String> {
    let (v3_key, v2_key) = field.keys();
    match package.format() {
        FormatVersion::V3 => package
            .root_value("properties")?
            .as_array()?
            .iter()
            .find(|property| property.get("key").and_then(Plist::as_str) == Some(v3_key))
            .and_then(property_value),
        FormatVersion::V2 => package
            .root_value(v2_key)
            .or_else(|| package.custom_parameter(v2_key))
            .and_then(Plist::to_text),
    }
}

/// Font info as the host sees it
pub fn read_font_info(package: &Package) -> FontInfo {
    let text = |key: &str| package.root_value(key).and_then(Plist::to_text);
    let integer = |key: &str| package.root_value(key).and_then(Plist::as_i64);
    let name = |field| read_name(package, field);
    FontInfo {
        family_name: text("familyName"),
        version_major: integer("versionMajor"),
        version_minor: integer("versionMinor"),
        copyright: name(NameField::Copyright),
        designer: name(NameField::Designer),
        designer_url: name(NameField::DesignerUrl),
        license_description: name(NameField::LicenseDescription),
        manufacturer: name(NameField::Manufacturer),
        manufacturer_url: name(NameField::ManufacturerUrl),
        trademark: name(NameField::Trademark),
        vendor_id: name(NameField::VendorId),
        units_per_em: package.units_per_em(),
        axes: package.design_space().font_axes(),
        sources: package.design_space().font_sources(),
    }
}
