//! Interactive session over stdin.
//!
//! Operations run in the background so the prompt stays usable while one is in flight;
//! a second trigger during that time is refused by the session's busy flag. Session events
//! are echoed to stderr as they arrive.

use super::NetworkArgs;
use abacus_client::Calculator;
use abacus_core::{InputField, Operation, SessionEvent, SessionState};
use abacus_devnet::Devnet;
use async_trait::async_trait;
use clap::Args;
use std::error::Error;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

const HELP: &str = "\
commands:
  connect | disconnect          manage the wallet connection
  set <input> [value]           set a, b, base, exponent or number (no value empties it)
  <operation> [operands...]     add, subtract, multiply, divide, power, sqrt
                                (without operands the current inputs are used)
  clear                         empty inputs and result
  show                          print the session state
  info                          print owner and scientific calculator address
  outage <read|inclusion> <on|off>
  help | quit";

/// Arguments for the `repl` subcommand.
#[derive(Args)]
pub struct ReplArgs {
    /// Connect the wallet before the first prompt.
    #[arg(long = "connect")]
    pub connect: bool,
    /// Do not echo session events.
    #[arg(long = "quiet")]
    pub quiet: bool,
    #[command(flatten)]
    pub network: NetworkArgs,
}

/// Which devnet fault to toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    Read,
    Inclusion,
}

/// One parsed line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Connect,
    Disconnect,
    Set(InputField, String),
    Run(Operation),
    Dispatch(Operation, Vec<String>),
    Clear,
    Show,
    Info,
    Outage(Fault, bool),
    Help,
    Quit,
    Empty,
}

/// Parses a line typed at the prompt.
pub fn parse_line(line: &str) -> Result<Input, String> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(Input::Empty);
    };
    let rest: Vec<&str> = words.collect();

    let input = match (command, rest.as_slice()) {
        ("connect", []) => Input::Connect,
        ("disconnect", []) => Input::Disconnect,
        ("clear", []) => Input::Clear,
        ("show", []) => Input::Show,
        ("info", []) => Input::Info,
        ("help" | "?", _) => Input::Help,
        ("quit" | "exit", _) => Input::Quit,
        ("set", [field]) => Input::Set(field.parse()?, String::new()),
        ("set", [field, value]) => Input::Set(field.parse()?, (*value).to_string()),
        ("set", _) => return Err("usage: set <input> [value]".into()),
        ("outage", [fault, state]) => {
            let fault = match *fault {
                "read" => Fault::Read,
                "inclusion" => Fault::Inclusion,
                other => {
                    return Err(format!("unknown fault `{other}` (expected read or inclusion)"));
                }
            };
            let enabled = match *state {
                "on" => true,
                "off" => false,
                other => return Err(format!("expected on or off, got `{other}`")),
            };
            Input::Outage(fault, enabled)
        }
        ("outage", _) => return Err("usage: outage <read|inclusion> <on|off>".into()),
        (operation, []) => Input::Run(operation.parse()?),
        (operation, operands) => Input::Dispatch(
            operation.parse()?,
            operands.iter().map(|s| (*s).to_string()).collect(),
        ),
    };
    Ok(input)
}

fn describe(state: &SessionState) -> String {
    let mut out = match state.account {
        Some(account) => format!("account: {account}\n"),
        None => "account: (not connected)\n".to_string(),
    };
    out.push_str(&format!("busy:    {}\n", state.busy));
    for field in InputField::ALL {
        let value = state.inputs.get(field);
        if !value.is_empty() {
            out.push_str(&format!("{:<8} {value}\n", field.name()));
        }
    }
    match &state.last {
        Some(last) => out.push_str(&format!("last:    {last}")),
        None => out.push_str("last:    -"),
    }
    out
}

async fn echo_events(mut events: broadcast::Receiver<SessionEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => eprintln!("  [{event}]"),
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                tracing::warn!(missed, "event echo fell behind");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn spawn_operation(
    calculator: &Arc<Calculator>,
    operation: Operation,
    operands: Option<Vec<String>>,
) -> JoinHandle<()> {
    let calculator = Arc::clone(calculator);
    tokio::spawn(async move {
        let result = match &operands {
            Some(operands) => {
                let operands: Vec<&str> = operands.iter().map(String::as_str).collect();
                calculator.dispatch(operation, &operands).await
            }
            None => calculator.run(operation).await,
        };
        match result {
            Ok(outcome) => println!("{} = {outcome}", operation.label()),
            Err(error) => eprintln!("error: {error}"),
        }
    })
}

/// Waits for operations still in flight so their outcome is printed before exit.
async fn drain(tasks: Vec<JoinHandle<()>>) -> usize {
    let mut finished = 0;
    for task in tasks {
        match task.await {
            Ok(()) => finished += 1,
            Err(error) => tracing::warn!(%error, "operation task failed"),
        }
    }
    finished
}

async fn handle(
    calculator: &Arc<Calculator>,
    devnet: &Devnet,
    tasks: &mut Vec<JoinHandle<()>>,
    input: Input,
) -> Result<(), Box<dyn Error>> {
    match input {
        Input::Connect => match calculator.connect().await {
            Ok(account) => println!("connected: {account}"),
            Err(error) => eprintln!("error: {error}"),
        },
        Input::Disconnect => calculator.disconnect(),
        Input::Set(field, value) => calculator.set_input(field, value),
        Input::Run(operation) => {
            tasks.retain(|task| !task.is_finished());
            tasks.push(spawn_operation(calculator, operation, None));
        }
        Input::Dispatch(operation, operands) => {
            tasks.retain(|task| !task.is_finished());
            tasks.push(spawn_operation(calculator, operation, Some(operands)));
        }
        Input::Clear => calculator.clear(),
        Input::Show => println!("{}", describe(&calculator.snapshot())),
        Input::Info => {
            let owner = calculator.owner().await;
            let scientific = calculator.scientific_calculator_address().await;
            match (owner, scientific) {
                (Ok(owner), Ok(scientific)) => {
                    println!("owner: {owner}\nscientific calculator: {scientific}")
                }
                (Err(error), _) | (_, Err(error)) => eprintln!("error: {error}"),
            }
        }
        Input::Outage(Fault::Read, enabled) => devnet.set_call_outage(enabled),
        Input::Outage(Fault::Inclusion, enabled) => devnet.set_inclusion_outage(enabled),
        Input::Help => println!("{HELP}"),
        Input::Quit | Input::Empty => {}
    }
    Ok(())
}

#[async_trait]
impl super::Command for ReplArgs {
    async fn execute(self) -> Result<(), Box<dyn Error>> {
        let (devnet, calculator) = self.network.start()?;
        let calculator = Arc::new(calculator);
        let echo = (!self.quiet).then(|| tokio::spawn(echo_events(calculator.subscribe())));

        let mut tasks = Vec::new();
        if self.connect {
            handle(&calculator, &devnet, &mut tasks, Input::Connect).await?;
        }
        println!("abacus on {} (type `help`)", calculator.contract_address());

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            match parse_line(&line) {
                Ok(Input::Quit) => break,
                Ok(input) => handle(&calculator, &devnet, &mut tasks, input).await?,
                Err(message) => eprintln!("{message}"),
            }
        }

        tasks.retain(|task| !task.is_finished());
        if !tasks.is_empty() {
            eprintln!("waiting for {} operation(s) in flight", tasks.len());
            drain(tasks).await;
        }
        calculator.disconnect();
        if let Some(echo) = echo {
            echo.abort();
        }
        Ok(())
    }
}
