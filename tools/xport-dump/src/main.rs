// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! xport-dump - Decode and print xport streams
//!
//! Reads an enveloped stream (or a sequence of length-prefixed envelopes)
//! without any local schemas, so every record shows up as an unresolved
//! field list, and prints the root values and the object graph behind them.

use clap::Parser;
use colored::*;
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufReader, Read};
use xport::framing::Frames;
use xport::{
    BinaryImporter, Decoded, Graph, ImportConfig, Object, TypeRegistry, Value, WarningPolicy,
};

/// Decode and print xport streams
#[derive(Parser, Debug)]
#[command(name = "xport-dump")]
#[command(version = "0.3.0")]
#[command(about = "Decode and print the values in an xport stream")]
struct Args {
    /// Input file ("-" for stdin)
    file: String,

    /// Output format: pretty, json
    #[arg(short, long, default_value = "pretty")]
    format: OutputFormat,

    /// Input is a sequence of length-prefixed envelopes
    #[arg(long)]
    frames: bool,

    /// Maximum nesting depth accepted while decoding
    #[arg(long, default_value_t = xport::DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Stop at the first schema warning instead of reporting it
    #[arg(long)]
    strict: bool,

    /// Quiet mode - roots only, no graph listing
    #[arg(long)]
    quiet: bool,
}

#[derive(Clone, Debug)]
enum OutputFormat {
    Pretty,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "p" => Ok(OutputFormat::Pretty),
            "json" | "j" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

/// Everything decoded from one envelope.
struct Stream {
    compressed: bool,
    roots: Vec<Decoded<Value>>,
    graph: Graph,
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let input: Box<dyn Read> = if args.file == "-" {
        Box::new(io::stdin().lock())
    } else {
        Box::new(BufReader::new(File::open(&args.file)?))
    };

    let streams = if args.frames {
        let mut streams = Vec::new();
        for frame in Frames::new(input) {
            streams.push(decode(frame?.as_slice(), args)?);
        }
        streams
    } else {
        vec![decode(input, args)?]
    };
    log::debug!("[xport-dump] decoded {} stream(s)", streams.len());

    match args.format {
        OutputFormat::Pretty => {
            for (i, stream) in streams.iter().enumerate() {
                print_pretty(i, stream, args);
            }
        }
        OutputFormat::Json => print_json(&streams),
    }
    Ok(())
}

fn decode<R: Read>(input: R, args: &Args) -> Result<Stream, Box<dyn std::error::Error>> {
    let policy = if args.strict {
        WarningPolicy::Fail
    } else {
        WarningPolicy::Log
    };
    let config = ImportConfig::default()
        .all_policies(policy)
        .retain_unresolved(true)
        .max_depth(args.max_depth);

    let mut importer = BinaryImporter::with_config(input, TypeRegistry::empty(), config)?;
    let compressed = importer.is_compressed();
    let mut roots = Vec::new();
    while let Some(decoded) = importer.read()? {
        roots.push(decoded);
    }
    Ok(Stream {
        compressed,
        roots,
        graph: importer.into_graph(),
    })
}

// ============================================================================
// Pretty output
// ============================================================================

fn print_pretty(index: usize, stream: &Stream, args: &Args) {
    println!();
    println!(
        "{}",
        format!("=== Stream {} ===", index + 1).bold()
    );
    println!(
        "  {} {}  {} {}  {} {}",
        "roots:".white(),
        stream.roots.len().to_string().cyan(),
        "objects:".white(),
        stream.graph.len().to_string().cyan(),
        "compressed:".white(),
        stream.compressed.to_string().cyan()
    );
    println!();

    let mut shown = HashSet::new();
    for (i, root) in stream.roots.iter().enumerate() {
        let mut out = String::new();
        render(&stream.graph, root.value(), 1, args.max_depth, &mut shown, &mut out);
        println!("  {} {}", format!("[{}]", i + 1).yellow(), out);
        for warning in root.warnings() {
            println!("      {} {}", "warning:".yellow().bold(), warning);
        }
    }

    if !args.quiet {
        println!();
        println!("{}", "--- Objects ---".dimmed());
        for (r, object) in stream.graph.iter() {
            println!(
                "  {} {} {}",
                format!("#{}", r.index()).green(),
                object.kind_name().white(),
                object.descriptor().to_string().cyan()
            );
        }
    }
}

fn render(
    graph: &Graph,
    value: &Value,
    indent: usize,
    max_depth: usize,
    shown: &mut HashSet<usize>,
    out: &mut String,
) {
    let Value::Ref(r) = value else {
        out.push_str(&inline(value));
        return;
    };
    let Some(object) = graph.get(*r) else {
        out.push_str(&format!("<dangling #{}>", r.index()));
        return;
    };
    if !shown.insert(r.index()) || indent > max_depth {
        out.push_str(&format!("-> #{}", r.index()));
        return;
    }

    let pad = "  ".repeat(indent + 2);
    out.push_str(&format!("#{} {} ", r.index(), object.descriptor()));
    match object {
        Object::Array(s) | Object::List(s) | Object::Set(s) => {
            out.push('[');
            for item in &s.items {
                out.push('\n');
                out.push_str(&pad);
                render(graph, item, indent + 1, max_depth, shown, out);
            }
            close(out, indent, !s.items.is_empty(), ']');
        }
        Object::Dictionary(d) => {
            out.push('{');
            for (k, v) in &d.entries {
                out.push('\n');
                out.push_str(&pad);
                render(graph, k, indent + 1, max_depth, shown, out);
                out.push_str(": ");
                render(graph, v, indent + 1, max_depth, shown, out);
            }
            close(out, indent, !d.entries.is_empty(), '}');
        }
        Object::Multiset(m) => {
            out.push('[');
            for (item, count) in &m.entries {
                out.push('\n');
                out.push_str(&pad);
                render(graph, item, indent + 1, max_depth, shown, out);
                out.push_str(&format!(" x{}", count));
            }
            close(out, indent, !m.entries.is_empty(), ']');
        }
        Object::Record(record) => {
            out.push('{');
            for (spec, field) in record.class().fields().iter().zip(record.fields()) {
                out.push('\n');
                out.push_str(&pad);
                out.push_str(&format!("{}: ", spec.name));
                render(graph, field, indent + 1, max_depth, shown, out);
            }
            close(out, indent, !record.fields().is_empty(), '}');
        }
        Object::Unresolved(u) => {
            out.push('{');
            for (name, field) in &u.fields {
                out.push('\n');
                out.push_str(&pad);
                out.push_str(&format!("{}: ", name));
                render(graph, field, indent + 1, max_depth, shown, out);
            }
            close(out, indent, !u.fields.is_empty(), '}');
        }
    }
}

fn close(out: &mut String, indent: usize, multiline: bool, bracket: char) {
    if multiline {
        out.push('\n');
        out.push_str(&"  ".repeat(indent + 1));
    }
    out.push(bracket);
}

fn inline(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(v) => v.to_string(),
        Value::I8(v) => format!("{}i8", v),
        Value::I16(v) => format!("{}i16", v),
        Value::I32(v) => v.to_string(),
        Value::I64(v) => format!("{}i64", v),
        Value::F32(v) => format!("{}f32", v),
        Value::F64(v) => format!("{:?}", v),
        Value::Char(c) => match char::from_u32(u32::from(*c)) {
            Some(ch) => format!("{:?}", ch),
            None => format!("'\\u{{{:04x}}}'", c),
        },
        Value::String(s) => format!("{:?}", s),
        Value::Enum(e) => format!("{}.{}", e.type_name, e.constant),
        Value::Ref(r) => format!("#{}", r.index()),
    }
}

// ============================================================================
// JSON output
// ============================================================================

fn print_json(streams: &[Stream]) {
    print!("[");
    for (i, stream) in streams.iter().enumerate() {
        if i > 0 {
            print!(",");
        }
        print!("{{\"compressed\":{},", stream.compressed);

        print!("\"roots\":[");
        for (j, root) in stream.roots.iter().enumerate() {
            if j > 0 {
                print!(",");
            }
            print!(
                "{{\"value\":{},\"warnings\":[{}]}}",
                json_value(root.value()),
                root.warnings()
                    .iter()
                    .map(|w| json_string(&w.to_string()))
                    .collect::<Vec<_>>()
                    .join(",")
            );
        }
        print!("],");

        print!("\"objects\":[");
        for (j, (r, object)) in stream.graph.iter().enumerate() {
            if j > 0 {
                print!(",");
            }
            print!(
                "{{\"id\":{},\"kind\":\"{}\",\"type\":{},{}}}",
                r.index(),
                object.kind_name(),
                json_string(&object.descriptor().to_string()),
                json_body(object)
            );
        }
        print!("]}}");
    }
    println!("]");
}

fn json_body(object: &Object) -> String {
    match object {
        Object::Array(s) | Object::List(s) | Object::Set(s) => {
            format!("\"items\":[{}]", join(s.items.iter().map(json_value)))
        }
        Object::Dictionary(d) => format!(
            "\"entries\":[{}]",
            join(d
                .entries
                .iter()
                .map(|(k, v)| format!("[{},{}]", json_value(k), json_value(v))))
        ),
        Object::Multiset(m) => format!(
            "\"entries\":[{}]",
            join(m
                .entries
                .iter()
                .map(|(v, n)| format!("{{\"value\":{},\"count\":{}}}", json_value(v), n)))
        ),
        Object::Record(record) => format!(
            "\"fields\":{{{}}}",
            join(record
                .class()
                .fields()
                .iter()
                .zip(record.fields())
                .map(|(spec, v)| format!("{}:{}", json_string(&spec.name), json_value(v))))
        ),
        Object::Unresolved(u) => format!(
            "\"fields\":{{{}}}",
            join(u
                .fields
                .iter()
                .map(|(name, v)| format!("{}:{}", json_string(name), json_value(v))))
        ),
    }
}

fn join(values: impl Iterator<Item = String>) -> String {
    values.collect::<Vec<_>>().join(",")
}

fn json_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(v) => v.to_string(),
        Value::I8(v) => v.to_string(),
        Value::I16(v) => v.to_string(),
        Value::I32(v) => v.to_string(),
        Value::I64(v) => v.to_string(),
        Value::Char(c) => c.to_string(),
        Value::F32(v) if v.is_finite() => v.to_string(),
        Value::F64(v) if v.is_finite() => v.to_string(),
        Value::F32(v) => json_string(&v.to_string()),
        Value::F64(v) => json_string(&v.to_string()),
        Value::String(s) => json_string(s),
        Value::Enum(e) => format!(
            "{{\"enum\":{},\"constant\":{}}}",
            json_string(&e.type_name),
            json_string(&e.constant)
        ),
        Value::Ref(r) => format!("{{\"ref\":{}}}", r.index()),
    }
}

fn json_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_string_escapes() {
        assert_eq!(json_string("a\"b\\c\n"), "\"a\\\"b\\\\c\\n\"");
        assert_eq!(json_string("\u{1}"), "\"\\u0001\"");
    }

    #[test]
    fn test_render_marks_repeated_objects() {
        let mut graph = Graph::new();
        let inner = graph.list(xport::TypeDescriptor::string(), vec![Value::from("x")]);
        let outer = graph.list(xport::TypeDescriptor::any(), vec![inner.clone(), inner]);

        let mut out = String::new();
        render(&graph, &outer, 1, 16, &mut HashSet::new(), &mut out);
        assert!(out.contains("\"x\""));
        assert!(out.contains("-> #0"));
    }

    #[test]
    fn test_format_parse() {
        assert!(matches!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json)));
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}
