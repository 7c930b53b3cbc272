//! The project identity test.

use super::Project;
use std::collections::BTreeMap;

/// Whether two project descriptions refer to the same real-world item.
///
/// True when any platform id matches, any slug or name matches
/// (case-insensitive), or either project's alias set names the other's
/// id, slug, or name.
///
/// This predicate is pairwise and order-dependent: A matching B and B
/// matching C does not imply A matches C directly. Dedup relies on
/// applying it incrementally as projects enter a store, so chains still
/// collapse in arrival order. It is intentionally not wired into
/// `Eq`/`Hash` and must never be used as a container key.
pub fn same_project(a: &Project, b: &Project) -> bool {
    ids_overlap(&a.id, &b.id)
        || values_overlap(&a.slug, &b.slug)
        || values_overlap(&a.name, &b.name)
        || aliases_cover(a, b)
        || aliases_cover(b, a)
}

/// Platform ids are opaque and compared exactly.
fn ids_overlap(a: &BTreeMap<String, String>, b: &BTreeMap<String, String>) -> bool {
    a.values().any(|id| b.values().any(|other| other == id))
}

/// Slugs and names vary in casing across platforms.
fn values_overlap(a: &BTreeMap<String, String>, b: &BTreeMap<String, String>) -> bool {
    a.values()
        .any(|v| b.values().any(|other| other.eq_ignore_ascii_case(v)))
}

/// Whether any alias of `a` names an id, slug, or name of `b`.
fn aliases_cover(a: &Project, b: &Project) -> bool {
    a.aliases.iter().any(|alias| {
        b.id.values().any(|id| id == alias)
            || b.slug.values().any(|slug| slug.eq_ignore_ascii_case(alias))
            || b.name.values().any(|name| name.eq_ignore_ascii_case(alias))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{ProjectType, UpdateStrategy};
    use std::collections::{BTreeMap, BTreeSet};

    fn bare() -> Project {
        Project {
            kind: ProjectType::Mod,
            id: BTreeMap::new(),
            name: BTreeMap::new(),
            slug: BTreeMap::new(),
            files: Vec::new(),
            graph_id: None,
            dependents: BTreeSet::new(),
            redistributable: true,
            update_strategy: UpdateStrategy::Latest,
            aliases: BTreeSet::new(),
        }
    }

    fn with_slug(platform: &str, slug: &str) -> Project {
        let mut p = bare();
        p.slug.insert(platform.to_string(), slug.to_string());
        p
    }

    #[test]
    fn test_matches_on_shared_id_across_platforms() {
        let mut a = bare();
        a.id.insert("curseforge".to_string(), "394468".to_string());
        let mut b = bare();
        b.id.insert("modrinth".to_string(), "394468".to_string());
        assert!(same_project(&a, &b));
    }

    #[test]
    fn test_matches_on_slug_case_insensitive() {
        let a = with_slug("modrinth", "Sodium");
        let b = with_slug("curseforge", "sodium");
        assert!(same_project(&a, &b));
        assert!(same_project(&b, &a));
    }

    #[test]
    fn test_matches_on_alias_naming_a_slug() {
        let mut a = bare();
        a.aliases.insert("sodium".to_string());
        let b = with_slug("modrinth", "sodium");
        assert!(same_project(&a, &b));
        assert!(same_project(&b, &a));
    }

    #[test]
    fn test_disjoint_projects_do_not_match() {
        let a = with_slug("modrinth", "sodium");
        let b = with_slug("modrinth", "lithium");
        assert!(!same_project(&a, &b));
    }

    #[test]
    fn test_chain_collapses_in_arrival_order() {
        // A matches B on slug; B matches C through an alias; A and C share
        // nothing directly. Incremental merging still dedups the chain:
        // fold B into A, then C matches the merged record.
        let a = with_slug("modrinth", "sodium");
        let mut b = with_slug("curseforge", "sodium");
        b.aliases.insert("sodium-fabric".to_string());
        let c = with_slug("github", "sodium-fabric");

        assert!(same_project(&a, &b));
        assert!(same_project(&b, &c));
        assert!(!same_project(&a, &c));

        let mut merged = a.clone();
        merged.merge_from(b);
        assert!(same_project(&merged, &c));
    }
}
