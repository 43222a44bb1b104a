//! Web3 bridge sample driver
//!
//! Plays the sample scene over stdio: one JSON `BridgeCommand` per stdin
//! line, every callback the host receives printed to stdout as a JSON line.
//! The browser half runs against the in-memory wallet library.
//!
//! Usage: web3-bridge-sample [--log-level <level>] [--receiver <name>]
//!                           [--address <0x..>] [--no-wallet]

use anyhow::{Context, Result, bail};
use std::rc::Rc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::level_filters::LevelFilter;
use tracing::{debug, info, warn};
use tracing_subscriber::FmtSubscriber;
use web3_bridge::memory::{
    MemoryGlobals, MemoryProvider, MemoryStyle, MemoryWallets, demo_wallet,
};
use web3_bridge::{BridgeSession, BrowserEnvironment, CommandDispatcher, ConnectedWallet};
use web3_bridge_core::{
    BridgeCommand, DEFAULT_RECEIVER_NAME, LogLevel, OutboundMessage, SignResult,
};
use web3_bridge_host::{CallbackHandler, HostConfig, HostReceiver, Web3Bridge};

const DEFAULT_ADDRESS: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

#[derive(Debug, Clone, PartialEq)]
struct SampleArgs {
    log_level: LogLevel,
    receiver: String,
    address: String,
    no_wallet: bool,
}

impl Default for SampleArgs {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            receiver: DEFAULT_RECEIVER_NAME.to_string(),
            address: DEFAULT_ADDRESS.to_string(),
            no_wallet: false,
        }
    }
}

impl SampleArgs {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut parsed = Self::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--log-level" => {
                    let value = args.next().context("--log-level needs a value")?;
                    parsed.log_level = value.parse().map_err(anyhow::Error::msg)?;
                }
                "--receiver" => {
                    parsed.receiver = args.next().context("--receiver needs a value")?;
                }
                "--address" => {
                    parsed.address = args.next().context("--address needs a value")?;
                }
                "--no-wallet" => parsed.no_wallet = true,
                other => bail!("Unknown argument: {}", other),
            }
        }

        if parsed.receiver.trim().is_empty() {
            bail!("--receiver cannot be empty");
        }
        Ok(parsed)
    }
}

fn level_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::None => LevelFilter::OFF,
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warning => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Verbose => LevelFilter::DEBUG,
    }
}

/// Prints every delivery as one JSON line on stdout
struct ConsoleCallbacks {
    object: String,
}

impl ConsoleCallbacks {
    fn emit(&self, method: &str, payload: &str) {
        let message = OutboundMessage::new(self.object.as_str(), method, payload);
        match serde_json::to_string(&message) {
            Ok(json) => println!("{}", json),
            Err(e) => warn!("Failed to serialize callback: {}", e),
        }
    }
}

impl CallbackHandler for ConsoleCallbacks {
    fn on_connected(&self, address: &str) {
        self.emit("OnConnected", address);
    }

    fn on_disconnected(&self) {
        self.emit("OnDisconnected", "");
    }

    fn on_signed(&self, signature: &str) {
        self.emit("OnSigned", signature);
    }

    fn on_connect_error(&self, message: &str) {
        self.emit("OnConnectError", message);
    }

    fn on_disconnect_error(&self, message: &str) {
        self.emit("OnDisconnectError", message);
    }

    fn on_sign_error(&self, message: &str) {
        self.emit("OnSignError", message);
    }

    fn on_sign_message_result(&self, result: &SignResult) {
        match result.to_json() {
            Ok(json) => self.emit(web3_bridge_host::SIGN_RESULT_METHOD, &json),
            Err(e) => warn!("Failed to serialize sign result: {}", e),
        }
    }

    fn on_message(&self, method: &str, payload: &str) -> bool {
        self.emit(method, payload);
        true
    }
}

fn scripted_wallet(args: &SampleArgs) -> ConnectedWallet {
    if args.no_wallet {
        ConnectedWallet::new("Empty Wallet", Rc::new(MemoryProvider::signing()))
    } else {
        demo_wallet("Demo Wallet", &args.address)
    }
}

fn print_command_error(line: &str, error: &str) {
    let report = serde_json::json!({
        "Type": "CommandError",
        "Line": line,
        "Error": error,
    });
    println!("{}", report);
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = SampleArgs::parse(std::env::args().skip(1))?;

    // stdout carries callbacks; logs go to stderr
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level_filter(args.log_level))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Web3 bridge sample starting");
    info!("Receiver object: {}", args.receiver);

    // Page side: wallet library, globals and document root
    let wallets = MemoryWallets::new();
    wallets.script_connect(vec![scripted_wallet(&args)]);

    let host = Rc::new(HostReceiver::new(
        args.receiver.clone(),
        ConsoleCallbacks {
            object: args.receiver.clone(),
        },
    ));
    let globals = MemoryGlobals::new();
    globals.insert("unityInstance", host);

    let environment = BrowserEnvironment::new(Rc::new(globals), Some(Rc::new(MemoryStyle::new())));
    let session = Rc::new(BridgeSession::new(wallets, environment));

    // Host side
    let config = HostConfig {
        log_level: args.log_level,
        receiver_name: args.receiver.clone(),
    };
    let bridge = Web3Bridge::with_config(CommandDispatcher::new(session), config);
    bridge
        .set_receiver(&args.receiver)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to set receiver: {}", e))?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        debug!("[Host→Bridge] {}", line);

        let result = match BridgeCommand::parse(line) {
            Ok(command) => bridge.execute(command).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            print_command_error(line, &e.to_string());
        }
    }

    info!("stdin closed, shutting down");
    Ok(())
}
