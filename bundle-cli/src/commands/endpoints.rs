//! List the endpoint catalog.

use bundle_core::{Catalog, RuleRegistry};
use std::io::Write;

/// Print the catalog in processing order.
pub fn run(catalog: &Catalog, registry: &RuleRegistry) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_listing(&mut out, catalog, registry)?;
    Ok(())
}

fn write_listing(
    out: &mut impl Write,
    catalog: &Catalog,
    registry: &RuleRegistry,
) -> std::io::Result<()> {
    writeln!(out, "{:<5} {:<26} {:<12} DESCRIPTION", "GROUP", "NAME", "CATEGORY")?;
    for endpoint in catalog.endpoints() {
        let marker = if registry.get(&endpoint.name).is_some() {
            ""
        } else {
            "  (no transform rule)"
        };
        writeln!(
            out,
            "{:<5} {:<26} {:<12} {}{}",
            endpoint.priority_group, endpoint.name, endpoint.category, endpoint.description, marker
        )?;
    }
    writeln!(out)?;
    writeln!(out, "{} endpoints", catalog.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_every_endpoint_in_order() {
        let mut out = Vec::new();
        write_listing(&mut out, &Catalog::bvl(), &RuleRegistry::bvl()).unwrap();
        let text = String::from_utf8(out).unwrap();

        let lines: Vec<_> = text.lines().collect();
        assert!(lines[1].starts_with("1     ghs_gefahrenhinweise "));
        assert!(lines[25].starts_with("6     awg_wartezeit "));
        assert!(text.ends_with("25 endpoints\n"));
        assert!(!text.contains("no transform rule"));
    }

    #[test]
    fn flags_endpoints_without_rule() {
        let mut out = Vec::new();
        write_listing(&mut out, &Catalog::bvl(), &RuleRegistry::new()).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("(no transform rule)").count(), 25);
    }
}
