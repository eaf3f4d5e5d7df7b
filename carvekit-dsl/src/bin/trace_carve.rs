/// Carved Context Tracer - Shows the flow through Scanner → Graph → Canonical form
///
/// Usage: cargo run --bin trace_carve <dump-file>

use carvekit_dsl::{canonicalize, parse, resolve_reachability, Scanner};
use std::fs;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: cargo run --bin trace_carve <dump-file>");
        eprintln!();
        eprintln!("Example:");
        eprintln!("  cargo run --bin trace_carve out/png_read_info_1_0");
        std::process::exit(1);
    }

    let dump_path = &args[1];

    println!("╔═══════════════════════════════════════════════════════════════");
    println!("║ CARVED CONTEXT TRACER");
    println!("╚═══════════════════════════════════════════════════════════════\n");

    let content = match fs::read_to_string(dump_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("❌ Failed to read {}: {}", dump_path, e);
            std::process::exit(1);
        }
    };

    println!("📝 INPUT DUMP:");
    println!("{}", content);
    println!();

    println!("🔍 SCANNED LINES:");
    println!("─────────────────────────────────────────────────────────────");
    for line in Scanner::new(&content) {
        match line {
            Ok(line) => println!(
                "{:>5} {} {:?}",
                line.line,
                if line.reached { '%' } else { ' ' },
                line.kind
            ),
            Err(e) => {
                println!("❌ {}", e);
                std::process::exit(1);
            }
        }
    }
    println!();

    let mut graph = match parse(&content) {
        Ok(graph) => graph,
        Err(e) => {
            println!("❌ {}", e);
            std::process::exit(1);
        }
    };
    resolve_reachability(&mut graph);

    println!("🌳 RESOLVED GRAPH:");
    println!("─────────────────────────────────────────────────────────────");
    match serde_json::to_string_pretty(&graph) {
        Ok(json) => println!("{}", json),
        Err(e) => println!("(graph not serializable: {})", e),
    }
    println!();

    match canonicalize(&content) {
        Ok(canonical) => {
            println!("📦 CANONICAL FORM:");
            println!("─────────────────────────────────────────────────────────────");
            println!("{}", canonical.text);
            println!();
            println!("Hash: {}", canonical.hash);
            println!();
            println!("✅ Canonicalization succeeded!");
        }
        Err(e) => {
            println!("❌ {}", e);
        }
    }
}
