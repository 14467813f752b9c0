use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

use guest_abi::catalog::{AbiKind, GUEST_CALLS, describe_call, find_call};
use guest_abi::report::LayoutReport;
use guest_abi::state::{MachineState, parse_value};
use guest_abi::{Step, StepLayout};

#[derive(Parser)]
#[command(name = "guest-abi")]
#[command(about = "Inspect how guest calls are laid out across ABI registers and stack")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the available ABIs and guest calls
    List,
    /// Show the layout of one guest call
    Layout {
        #[arg(help = "Guest call name (see `guest-abi list`)")]
        call: String,

        #[arg(short, long, help = "ABI to lay the call out under")]
        abi: AbiKind,

        #[arg(
            short,
            long,
            help = "Machine state file with 'sp = ADDR' and 'rN = VALUE' lines"
        )]
        state: Option<PathBuf>,

        #[arg(long, value_parser = parse_value, help = "Stack pointer, overrides the state file")]
        sp: Option<u64>,

        #[arg(long, help = "Print the layout as JSON")]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::List => {
            println!("ABIs:");
            for abi in AbiKind::ALL {
                println!("  {abi}");
            }
            println!("Calls:");
            for call in GUEST_CALLS {
                println!("  {:<10} {}", call.name, call.summary);
            }
        }
        Commands::Layout {
            call,
            abi,
            state,
            sp,
            json,
        } => {
            if find_call(&call).is_none() {
                anyhow::bail!("unknown guest call '{call}', run `guest-abi list` for the catalog");
            }

            let contents = state.as_deref().map(read_state_file).transpose()?;
            let machine = machine_state(contents.as_deref(), sp)
                .with_context(|| format!("Failed to parse {}", display_path(state.as_deref())))?;
            tracing::debug!(stack_pointer = machine.stack_pointer(), "machine state ready");

            let report = describe_call(abi, &call, &machine)
                .with_context(|| format!("Failed to lay out {call} under {abi}"))?;

            if json {
                let value = report_json(&report);
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("{report}");
            }
        }
    }

    Ok(())
}

fn read_state_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn display_path(path: Option<&Path>) -> String {
    path.map_or_else(|| "machine state".to_string(), |p| p.display().to_string())
}

/// Build the machine state from an optional state file's contents; an
/// explicit stack pointer wins over the file's `sp` line.
fn machine_state(contents: Option<&str>, sp: Option<u64>) -> guest_abi::Result<MachineState> {
    let mut machine = match contents {
        Some(text) => MachineState::parse(text)?,
        None => MachineState::new(),
    };
    if let Some(sp) = sp {
        machine = machine.with_stack_pointer(sp);
    }
    Ok(machine)
}

fn report_json(report: &LayoutReport) -> serde_json::Value {
    let steps: Vec<serde_json::Value> = report.steps().iter().map(step_json).collect();
    serde_json::json!({
        "abi": report.abi(),
        "signature": report.signature(),
        "steps": steps,
        "registers_used": report.registers_used(),
        "stack_used": report.stack_used(),
        "final_position": report.final_position(),
    })
}

fn step_json(step: &StepLayout) -> serde_json::Value {
    let (role, index) = match step.step {
        Step::Result => ("result", None),
        Step::Argument(index) => ("argument", Some(index)),
    };
    serde_json::json!({
        "role": role,
        "index": index,
        "type": step.type_name,
        "registers": [step.registers.start, step.registers.end],
        "register_names": step.register_names,
        "stack": [step.stack.start, step.stack.end],
    })
}
