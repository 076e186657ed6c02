//! Network-graph export in GEXF form. Nodes are the unique domains
//! observed; a directed edge records how often one domain was followed
//! by another in chronological order within the same browser.
//! Self-transitions are not edges.

use std::collections::BTreeMap;
use std::fmt::Write;

use super::{ExportError, Exporter};
use crate::model::{BrowserKind, CanonicalVisit};

pub struct GephiExporter;

impl Exporter for GephiExporter {
    fn export(&self, visits: &[CanonicalVisit]) -> Result<Vec<u8>, ExportError> {
        // Oldest first; ties broken by URL so edge weights are stable.
        let mut ordered: Vec<&CanonicalVisit> = visits.iter().collect();
        ordered.sort_by(|a, b| {
            a.visited_at
                .cmp(&b.visited_at)
                .then_with(|| a.url.cmp(&b.url))
        });

        let mut node_ids: BTreeMap<String, usize> = BTreeMap::new();
        for visit in &ordered {
            let next = node_ids.len();
            node_ids.entry(visit.domain()).or_insert(next);
        }

        let mut edges: BTreeMap<(usize, usize), u64> = BTreeMap::new();
        let mut last_seen: BTreeMap<BrowserKind, usize> = BTreeMap::new();
        for visit in &ordered {
            let node = node_ids[&visit.domain()];
            if let Some(prev) = last_seen.insert(visit.browser, node) {
                if prev != node {
                    *edges.entry((prev, node)).or_default() += 1;
                }
            }
        }

        let mut out = String::new();
        writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
        writeln!(
            out,
            r#"<gexf xmlns="http://gexf.net/1.3" version="1.3">"#
        )?;
        writeln!(out, r#"  <graph defaultedgetype="directed">"#)?;

        writeln!(out, "    <nodes>")?;
        for (domain, id) in &node_ids {
            writeln!(
                out,
                r#"      <node id="{}" label="{}" />"#,
                id,
                xml_escape(domain)
            )?;
        }
        writeln!(out, "    </nodes>")?;

        writeln!(out, "    <edges>")?;
        for (edge_id, ((source, target), weight)) in edges.iter().enumerate() {
            writeln!(
                out,
                r#"      <edge id="{edge_id}" source="{source}" target="{target}" weight="{weight}" />"#,
            )?;
        }
        writeln!(out, "    </edges>")?;

        writeln!(out, "  </graph>")?;
        writeln!(out, "</gexf>")?;
        Ok(out.into_bytes())
    }
}

fn xml_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
