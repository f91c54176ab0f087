use arbor_tree::{Element, Node, Patch, Pointer, Target, Value};
use clap::{Parser, Subcommand};
use itertools::Itertools;
use miette::IntoDiagnostic;
use miette::miette;
use std::fs;
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "arbor")]
#[command(version)]
#[command(after_help = "Examples:\n\n\
    To select nodes:\n\
    $ arbor select '//book[price > 10]/title' catalog.json\n\n\
    To apply a JSON patch:\n\
    $ arbor patch '[{\"op\": \"remove\", \"path\": \"/store/0\"}]' catalog.json\n\n\
    To resolve a pointer:\n\
    $ arbor pointer /store/books/0 catalog.json")]
#[command(
    about = "arbor selects, patches and addresses JSON documents as trees.",
    long_about = None
)]
pub struct Cli {
    #[clap(flatten)]
    output: OutputArgs,

    #[clap(subcommand)]
    commands: Commands,

    #[command(flatten)]
    pub verbose: clap_verbosity_flag::Verbosity,
}

#[derive(Clone, Debug, clap::Args, Default)]
struct OutputArgs {
    /// Compact instead of pretty-printed output
    #[clap(short, long, global = true)]
    compact_output: bool,

    /// Output to the specified file
    #[clap(short = 'o', long = "output", value_name = "FILE", global = true)]
    output_file: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the nodes matched by a selector as a JSON array
    Select {
        selector: String,
        /// Print the pointer of each match instead of its value
        #[arg(short, long, conflicts_with = "with_pointers")]
        pointers: bool,
        /// Print each match as an object holding its pointer and value
        #[arg(short, long)]
        with_pointers: bool,
        /// JSON document; stdin when omitted
        file: Option<PathBuf>,
    },
    /// Apply an RFC 6902 patch document and print the patched document
    Patch {
        patch: String,
        /// JSON document; stdin when omitted
        file: Option<PathBuf>,
    },
    /// Print the value a pointer resolves to
    Pointer {
        pointer: String,
        /// JSON document; stdin when omitted
        file: Option<PathBuf>,
    },
    /// Evaluate a predicate expression against the document root
    Eval {
        expression: String,
        /// JSON document; stdin when omitted
        file: Option<PathBuf>,
    },
}

impl Cli {
    pub fn run(&self) -> miette::Result<()> {
        match &self.commands {
            Commands::Select {
                selector,
                pointers,
                with_pointers,
                file,
            } => {
                let document = read_document(file.as_ref())?;
                let matches = arbor_tree::select(selector, &document)?;
                tracing::debug!(matches = matches.len(), "selected nodes");

                if *pointers {
                    self.write(&matches.iter().map(|node| node.pointer()).join("\n"))
                } else if *with_pointers {
                    self.print(&serde_json::Value::Array(
                        matches
                            .iter()
                            .map(|node| serde_json::json!({"pointer": node.pointer().to_string(), "value": node.to_json()}))
                            .collect(),
                    ))
                } else {
                    self.print(&serde_json::Value::Array(matches.iter().map(Element::to_json).collect()))
                }
            }
            Commands::Patch { patch, file } => {
                let document = read_document(file.as_ref())?;
                let patch = Patch::from_json(patch).into_diagnostic()?;
                tracing::debug!(operations = patch.len(), "parsed patch");

                let patched = patch.apply(&document).into_diagnostic()?;
                self.print(&patched.to_json())
            }
            Commands::Pointer { pointer, file } => {
                let document = read_document(file.as_ref())?;
                let pointer = Pointer::parse(pointer).into_diagnostic()?;

                match pointer.evaluate(&document) {
                    Some(Target::Node(node)) => self.print(&node.to_json()),
                    Some(Target::Index(index)) => self.print(&serde_json::Value::from(index)),
                    None => Err(miette!("Pointer \"{}\" does not resolve in the document", pointer)),
                }
            }
            Commands::Eval { expression, file } => {
                let document = read_document(file.as_ref())?;
                let value = arbor_tree::evaluate(expression, &document)?;
                self.print(&value_to_json(value))
            }
        }
    }

    fn print(&self, value: &serde_json::Value) -> miette::Result<()> {
        let text = if self.output.compact_output {
            serde_json::to_string(value)
        } else {
            serde_json::to_string_pretty(value)
        }
        .into_diagnostic()?;

        self.write(&text)
    }

    fn write(&self, text: &str) -> miette::Result<()> {
        let stdout = io::stdout();
        let mut handle: Box<dyn Write> = if let Some(output_file) = &self.output.output_file {
            let file = fs::File::create(output_file).into_diagnostic()?;
            Box::new(BufWriter::new(file))
        } else {
            Box::new(BufWriter::new(stdout.lock()))
        };

        writeln!(handle, "{}", text).into_diagnostic()?;
        handle.flush().into_diagnostic()
    }
}

fn read_document(file: Option<&PathBuf>) -> miette::Result<Element> {
    let content = match file {
        Some(file) => fs::read_to_string(file).into_diagnostic()?,
        None => {
            let mut input = String::new();
            io::stdin().read_to_string(&mut input).into_diagnostic()?;
            input
        }
    };

    let json: serde_json::Value = serde_json::from_str(&content).into_diagnostic()?;
    Ok(Element::from_json("", &json))
}

fn value_to_json(value: Value<Element>) -> serde_json::Value {
    match value {
        Value::Bool(b) => serde_json::Value::Bool(b),
        Value::Number(n) => match n.as_int() {
            Some(int) => serde_json::Value::from(int),
            None => serde_json::Number::from_f64(n.value())
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
        },
        Value::String(s) => serde_json::Value::String(s),
        Value::Node(node) => node.to_json(),
        Value::None => serde_json::Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use scopeguard::defer;

    fn create_file(name: &str, content: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("arbor-cli-{}-{}", std::process::id(), name));
        fs::write(&path, content).expect("Failed to write temp file");
        path
    }

    fn run(commands: Commands, output_file: &PathBuf) -> miette::Result<String> {
        let cli = Cli {
            output: OutputArgs {
                compact_output: true,
                output_file: Some(output_file.clone()),
            },
            commands,
            verbose: clap_verbosity_flag::Verbosity::new(0, 0),
        };

        cli.run()?;
        fs::read_to_string(output_file).into_diagnostic()
    }

    #[rstest]
    #[case::select(
        "select.json",
        |file| Commands::Select { selector: "a/*[. > 1]".to_string(), pointers: false, with_pointers: false, file },
        "[2,3]\n"
    )]
    #[case::select_with_pointers(
        "select_with_pointers.json",
        |file| Commands::Select { selector: "b".to_string(), pointers: false, with_pointers: true, file },
        "[{\"pointer\":\"/1\",\"value\":\"x\"}]\n"
    )]
    #[case::select_pointers(
        "select_pointers.json",
        |file| Commands::Select { selector: "//*[. = 3]".to_string(), pointers: true, with_pointers: false, file },
        "/0/2\n"
    )]
    #[case::patch(
        "patch.json",
        |file| Commands::Patch { patch: r#"[{"op": "remove", "path": "/a/0"}]"#.to_string(), file },
        "{\"a\":[2,3],\"b\":\"x\"}\n"
    )]
    #[case::pointer(
        "pointer.json",
        |file| Commands::Pointer { pointer: "/b".to_string(), file },
        "\"x\"\n"
    )]
    #[case::eval(
        "eval.json",
        |file| Commands::Eval { expression: "count(a) * 2".to_string(), file },
        "6\n"
    )]
    fn test_cli_commands(
        #[case] name: &str,
        #[case] commands: fn(Option<PathBuf>) -> Commands,
        #[case] expected: &str,
    ) {
        let input = create_file(name, r#"{"a": [1, 2, 3], "b": "x"}"#);
        let output = create_file(&format!("out-{}", name), "");
        let (input_clone, output_clone) = (input.clone(), output.clone());

        defer! {
            let _ = fs::remove_file(&input_clone);
            let _ = fs::remove_file(&output_clone);
        }

        assert_eq!(run(commands(Some(input)), &output).unwrap(), expected);
    }

    #[test]
    fn test_cli_unresolved_pointer() {
        let input = create_file("unresolved.json", r#"{"a": 1}"#);
        let output = create_file("out-unresolved.json", "");
        let (input_clone, output_clone) = (input.clone(), output.clone());

        defer! {
            let _ = fs::remove_file(&input_clone);
            let _ = fs::remove_file(&output_clone);
        }

        let result = run(
            Commands::Pointer {
                pointer: "/missing".to_string(),
                file: Some(input),
            },
            &output,
        );

        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_global_flags() {
        let cli = Cli::try_parse_from(["arbor", "select", "//a", "-c", "doc.json"]).unwrap();

        assert!(cli.output.compact_output);
        assert!(matches!(
            cli.commands,
            Commands::Select { ref selector, pointers: false, with_pointers: false, file: Some(_) } if selector == "//a"
        ));
    }

    #[test]
    fn test_cli_pointer_modes_conflict() {
        assert!(Cli::try_parse_from(["arbor", "select", "-p", "-w", "//a"]).is_err());
    }

    #[rstest]
    #[case(Value::Bool(true), serde_json::json!(true))]
    #[case(Value::Number(3.into()), serde_json::json!(3))]
    #[case(Value::Number(arbor_tree::Number::new(0.5)), serde_json::json!(0.5))]
    #[case(Value::Number(arbor_tree::number::NAN), serde_json::Value::Null)]
    #[case(Value::Number(arbor_tree::Number::new(1e20)), serde_json::json!(1e20))]
    #[case(Value::String("s".to_string()), serde_json::json!("s"))]
    #[case(Value::None, serde_json::Value::Null)]
    fn test_value_to_json(#[case] value: Value<Element>, #[case] expected: serde_json::Value) {
        assert_eq!(value_to_json(value), expected);
    }
}
