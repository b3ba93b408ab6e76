//! The cross-file unit collection and its derived indices.

use indexmap::IndexMap;

use super::method::Signature;
use super::unit::SourceUnit;

/// A reference to a signature owned by the collection.
///
/// The collection outlives every index it exposes, so positions are
/// stored instead of pointers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureRef {
    /// The index of the owning unit.
    pub unit: usize,
    /// The index of the method within the unit.
    pub method: usize,
}

/// Represents the ordered collection of source units for a compilation,
/// along with the indices derived from them:
///
/// - the union of copyright and license lines (deduplicated, in
///   first-occurrence order),
/// - the resolved-types map from short name to fully-qualified name
///   (first writer wins), and
/// - the signatures index from mangled name to signature (duplicates
///   permitted).
#[derive(Debug, Clone, Default)]
pub struct UnitCollection {
    /// The units, in the order they were added.
    units: Vec<SourceUnit>,
    /// The union of copyright lines across units.
    copyright_lines: Vec<String>,
    /// The union of license lines across units.
    license_lines: Vec<String>,
    /// The resolved-types map from short name to fully-qualified name.
    resolved_types: IndexMap<String, String>,
    /// The signatures index, in insertion order.
    signatures: Vec<(String, SignatureRef)>,
}

impl UnitCollection {
    /// Creates a new, empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a unit to the collection, updating the derived indices.
    ///
    /// Once added, a unit is read-only.
    pub fn add(&mut self, unit: SourceUnit) {
        let index = self.units.len();

        for line in &unit.copyright_lines {
            if !self.copyright_lines.contains(line) {
                self.copyright_lines.push(line.clone());
            }
        }

        for line in &unit.license_lines {
            if !self.license_lines.contains(line) {
                self.license_lines.push(line.clone());
            }
        }

        // First writer wins: a later unit with the same short name does
        // not replace the mapping.
        self.resolved_types
            .entry(unit.name.clone())
            .or_insert_with(|| unit.full_name());

        let prefix = unit.prefix();
        for (method, m) in unit.methods.iter().enumerate() {
            self.signatures.push((
                m.signature.mangled_name(&prefix),
                SignatureRef {
                    unit: index,
                    method,
                },
            ));
        }

        self.units.push(unit);
    }

    /// Gets the units of the collection.
    pub fn units(&self) -> &[SourceUnit] {
        &self.units
    }

    /// Gets the union of copyright lines across units.
    pub fn copyright_lines(&self) -> &[String] {
        &self.copyright_lines
    }

    /// Gets the union of license lines across units.
    pub fn license_lines(&self) -> &[String] {
        &self.license_lines
    }

    /// Gets the resolved-types map from short name to fully-qualified
    /// name, in insertion order.
    pub fn resolved_types(&self) -> &IndexMap<String, String> {
        &self.resolved_types
    }

    /// Resolves a type name against the collection.
    ///
    /// Unresolved names resolve to themselves.
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.resolved_types
            .get(name)
            .map(String::as_str)
            .unwrap_or(name)
    }

    /// Gets the signatures index, in insertion order.
    pub fn signatures(&self) -> impl Iterator<Item = (&str, &SourceUnit, &Signature)> {
        self.signatures.iter().map(|(name, r)| {
            let unit = &self.units[r.unit];
            (name.as_str(), unit, &unit.methods[r.method].signature)
        })
    }
}

#[cfg(test)]
mod test {
    use std::path::Path;

    use pretty_assertions::assert_eq;

    use super::*;

    /// Parses a unit, asserting that it produced no diagnostics.
    fn unit(path: &str, source: &str) -> SourceUnit {
        let (unit, diagnostics) = SourceUnit::parse(Path::new(path), source);
        assert!(
            diagnostics.is_empty(),
            "unexpected diagnostics: {diagnostics:?}"
        );
        unit
    }

    #[test]
    fn resolved_types_first_writer_wins() {
        let mut collection = UnitCollection::new();
        collection.add(unit("src/ix.base/String.ix", "public class { }"));
        collection.add(unit("src/ix.util/String.ix", "public class { }"));

        assert_eq!(collection.resolve("String"), "ix.base.String");
        assert_eq!(collection.resolve("Unknown"), "Unknown");
    }

    #[test]
    fn header_line_union() {
        let mut collection = UnitCollection::new();
        collection.add(unit(
            "src/ix.base/A.ix",
            "Copyright 2021 X\nLicense MIT\npublic class { }",
        ));
        collection.add(unit(
            "src/ix.base/B.ix",
            "Copyright 2021 X\nCopyright 2022 Y\nLicense MIT\npublic class { }",
        ));

        assert_eq!(
            collection.copyright_lines(),
            &["2021 X".to_string(), "2022 Y".to_string()]
        );
        assert_eq!(collection.license_lines(), &["MIT".to_string()]);
    }

    #[test]
    fn signature_index() {
        let mut collection = UnitCollection::new();
        collection.add(unit(
            "src/ix.base/Thing.ix",
            "public class { }\npublic new( name: string* )\n{\n}\npublic get()\n{\n}\n",
        ));

        let names: Vec<_> = collection.signatures().map(|(name, _, _)| name).collect();
        assert_eq!(
            names,
            &["ix_base_Thing__new__name", "ix_base_Thing__get"]
        );
    }
}
