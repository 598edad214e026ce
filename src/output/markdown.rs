//! Markdown report generation
//!
//! This module renders a crawl as a human-readable markdown report with the
//! resolved server, a per-type summary and the catalog tree.

use crate::model::ResourceNode;
use crate::output::CatalogReport;
use crate::Result;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown report for a crawl
///
/// # Arguments
///
/// * `report` - The crawl to render
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the report
/// * `Err(CatalogError::Io)` - Failed to write the file
pub fn write_markdown(report: &CatalogReport, output_path: &Path) -> Result<()> {
    let markdown = format_markdown(report);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    tracing::info!("Wrote catalog report to {}", output_path.display());
    Ok(())
}

/// Formats a crawl as markdown
pub fn format_markdown(report: &CatalogReport) -> String {
    let mut md = String::new();

    md.push_str("# Catalog Report\n\n");

    md.push_str("## Connection\n\n");
    md.push_str(&format!("- **Connection**: `{}`\n", report.connection));
    md.push_str(&format!(
        "- **Generated**: {}\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    let filter_names = report.filter.names();
    if filter_names.is_empty() {
        md.push_str("- **Filter**: none\n\n");
    } else {
        md.push_str(&format!("- **Filter**: {}\n\n", filter_names.join(", ")));
    }

    if let Some(server) = &report.server {
        md.push_str("## Server\n\n");
        md.push_str(&format!("- **Services URL**: {}\n", server.url));
        md.push_str(&format!("- **Base URL**: {}\n", server.base_url));
        if let Some(proxy) = &server.proxy_url {
            md.push_str(&format!("- **Proxy**: {}\n", proxy));
        }
        let auth = &server.authentication_info;
        md.push_str(&format!(
            "- **Token Authentication**: {}\n",
            if auth.supports_token_authentication {
                "supported"
            } else {
                "not supported"
            }
        ));
        if let Some(tokens) = &auth.token_services_url {
            md.push_str(&format!("- **Token Service**: {}\n", tokens));
        }
        md.push('\n');
    }

    md.push_str("## Summary\n\n");
    md.push_str(&format!("- **Total Resources**: {}\n", report.total()));
    md.push_str(&format!("- **Services**: {}\n", report.service_count()));
    md.push_str(&format!("- **Layers**: {}\n\n", report.layer_count()));

    let counts = report.type_counts();
    if !counts.is_empty() {
        md.push_str("| Type | Count |\n");
        md.push_str("|------|-------|\n");
        for (resource_type, count) in &counts {
            md.push_str(&format!("| {} | {} |\n", resource_type, count));
        }
        md.push('\n');
    }

    md.push_str("## Catalog\n\n");
    if report.nodes.is_empty() {
        md.push_str("_No resources matched._\n");
    } else {
        for node in &report.nodes {
            write_node(&mut md, node, 0);
        }
    }

    md
}

fn write_node(md: &mut String, node: &ResourceNode, depth: usize) {
    let resource = &node.resource;
    md.push_str(&"  ".repeat(depth));
    md.push_str(&format!(
        "- [{}]({}) `{}`",
        escape(&resource.display_name),
        resource.url,
        resource.resource_type
    ));
    if let Some(tag) = &resource.tag {
        md.push_str(&format!(" ({})", tag));
    }
    md.push('\n');

    for child in &node.children {
        write_node(md, child, depth + 1);
    }
}

/// Escapes characters that would break link text
fn escape(text: &str) -> String {
    text.replace('[', "\\[").replace(']', "\\]")
}
