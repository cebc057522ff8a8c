use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use crate::models::{Dependency, LicenseSource};
use crate::pipeline::Partition;

/// Render a colored summary of a run.
///
/// Missing dependencies are always listed; resolved ones only with `verbose`.
pub fn render(result: &Partition, verbose: bool, quiet: bool) {
    let total = result.resolved.len() + result.missing.len();
    let resolved = result.resolved.len();
    let missing = result.missing.len();

    if quiet {
        println!(
            "Total: {}  Resolved: {}  Missing: {}",
            total,
            resolved.to_string().green(),
            missing.to_string().red(),
        );
        return;
    }

    println!(
        "\n {} v{}\n",
        "license-fetchr".bold(),
        env!("CARGO_PKG_VERSION")
    );

    println!(" ┌────────────────────────────────────────────────────┐");
    println!(" │  {:<48} │", "SUMMARY".bold());
    println!(" │  {:<48} │", format!("Total dependencies : {}", total));
    println!(
        " │  {:<48} │",
        format!("{}  Resolved        : {:>4}  {}", "✓".green(), resolved, by_source(&result.resolved))
    );
    println!(
        " │  {:<48} │",
        format!("{}  Missing         : {:>4}", "✗".red(), missing)
    );
    println!(" └────────────────────────────────────────────────────┘\n");

    if missing > 0 {
        println!(
            " {} Dependencies without a license (add them to the manual licenses file):\n",
            "[MISSING]".red().bold()
        );
        render_table(&result.missing);
    }

    if verbose && resolved > 0 {
        println!(" {} Resolved dependencies:\n", "[OK]".green().bold());
        render_table(&result.resolved);
    }
}

fn render_table(deps: &[Dependency]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Dependency").add_attribute(Attribute::Bold),
            Cell::new("License").add_attribute(Attribute::Bold),
            Cell::new("Source").add_attribute(Attribute::Bold),
            Cell::new("URL").add_attribute(Attribute::Bold),
        ]);

    for dep in deps {
        let license = if dep.is_resolved() {
            Cell::new(&dep.spdx_id).fg(Color::Green)
        } else {
            Cell::new("—").fg(Color::Red)
        };
        table.add_row(vec![
            Cell::new(&dep.name),
            license,
            Cell::new(dep.source.to_string()),
            Cell::new(&dep.url),
        ]);
    }

    println!("{}\n", table);
}

/// e.g. `github 40, manual 3`
fn by_source(deps: &[Dependency]) -> String {
    [LicenseSource::Forge, LicenseSource::Registry, LicenseSource::Manual]
        .iter()
        .filter_map(|source| {
            let count = deps.iter().filter(|d| d.source == *source).count();
            (count > 0).then(|| format!("{} {}", source, count))
        })
        .collect::<Vec<_>>()
        .join(", ")
}
