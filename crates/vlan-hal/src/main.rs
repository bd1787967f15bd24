//! vlan-hal - command line front end for the VLAN HAL
//!
//! One subcommand per HAL operation. Exit status 0 means `RETURN_OK`,
//! 1 means `RETURN_ERR`.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fmt::Display;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vlan_hal::{BackendKind, DynVlanHal, HalConfig, DEFAULT_CONFIG_PATH};

/// VLAN hardware abstraction layer
#[derive(Parser, Debug)]
#[command(name = "vlan-hal")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// HAL configuration file
    #[arg(short = 'c', long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Use the mock bridge backend instead of brctl/ip; its bridges are
    /// kept in a state file next to the VLAN config store
    #[arg(long)]
    mock: bool,

    /// Print reports as JSON
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a VLAN group (bridge) with a default VLAN ID
    AddGroup {
        group: String,
        default_vlan_id: String,
    },
    /// Delete a VLAN group
    DelGroup { group: String },
    /// Attach an interface to a group under a VLAN tag
    AddInterface {
        group: String,
        if_name: String,
        vlan_id: String,
    },
    /// Detach an interface from a group
    DelInterface {
        group: String,
        if_name: String,
        vlan_id: String,
    },
    /// Detach every interface from a group
    DeleteAllInterfaces { group: String },
    /// Print the members of a group
    PrintGroup { group: String },
    /// Print every group
    PrintAllGroup,
    /// Print the persisted VLAN ID configuration
    PrintAllVlanIdConfiguration,
    /// Check whether a bridge exists
    IsGroupAvailable { br_name: String },
    /// Check whether an interface/VLAN pair is in any bridge
    IsInterfaceAvailable { if_name: String, vlan_id: String },
    /// Check whether an interface/VLAN pair is in the given bridge
    IsInterfaceAvailableInBridge {
        if_name: String,
        br_name: String,
        vlan_id: String,
    },
    /// Persist a group -> VLAN ID mapping
    InsertVlanConfigEntry { group: String, vlan_id: String },
    /// Remove a persisted mapping
    DeleteVlanConfigEntry { group: String },
    /// Print the persisted VLAN ID of a group
    GetVlanId { group: String },
}

fn init_logging(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();
}

fn emit<T: Serialize + Display>(report: &T, json: bool) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut stdout, report).context("serializing report")?;
        writeln!(stdout)?;
    } else {
        write!(stdout, "{}", report)?;
    }
    Ok(())
}

fn probe(available: bool, what: &str) -> anyhow::Result<()> {
    if available {
        println!("{} is available", what);
        Ok(())
    } else {
        anyhow::bail!("{} is not available", what)
    }
}

async fn run(hal: &DynVlanHal, command: Command, json: bool) -> anyhow::Result<()> {
    match command {
        Command::AddGroup {
            group,
            default_vlan_id,
        } => hal.add_group(Some(&group), Some(&default_vlan_id)).await?,
        Command::DelGroup { group } => hal.del_group(Some(&group)).await?,
        Command::AddInterface {
            group,
            if_name,
            vlan_id,
        } => {
            hal.add_interface(Some(&group), Some(&if_name), Some(&vlan_id))
                .await?
        }
        Command::DelInterface {
            group,
            if_name,
            vlan_id,
        } => {
            hal.del_interface(Some(&group), Some(&if_name), Some(&vlan_id))
                .await?
        }
        Command::DeleteAllInterfaces { group } => {
            let removed = hal.delete_all_interfaces(Some(&group)).await?;
            println!("Removed {} interfaces from {}", removed, group);
        }
        Command::PrintGroup { group } => emit(&hal.group_report(Some(&group)).await?, json)?,
        Command::PrintAllGroup => emit(&hal.all_groups_report().await?, json)?,
        Command::PrintAllVlanIdConfiguration => emit(&hal.vlan_config_report().await?, json)?,
        Command::IsGroupAvailable { br_name } => {
            let available = hal
                .is_group_available_in_linux_bridge(Some(&br_name))
                .await?;
            probe(available, &br_name)?
        }
        Command::IsInterfaceAvailable { if_name, vlan_id } => {
            let available = hal
                .is_interface_available_in_linux_bridge(Some(&if_name), Some(&vlan_id))
                .await?;
            probe(available, &format!("{}.{}", if_name, vlan_id))?
        }
        Command::IsInterfaceAvailableInBridge {
            if_name,
            br_name,
            vlan_id,
        } => {
            let available = hal
                .is_interface_available_in_given_linux_bridge(
                    Some(&if_name),
                    Some(&br_name),
                    Some(&vlan_id),
                )
                .await?;
            probe(available, &format!("{}.{} in {}", if_name, vlan_id, br_name))?
        }
        Command::InsertVlanConfigEntry { group, vlan_id } => {
            hal.insert_vlan_config_entry(Some(&group), Some(&vlan_id))
                .await?
        }
        Command::DeleteVlanConfigEntry { group } => {
            hal.delete_vlan_config_entry(Some(&group)).await?
        }
        Command::GetVlanId { group } => {
            let vlan_id = hal.get_vlan_id_for_group_name(Some(&group)).await?;
            println!("{}", vlan_id);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level);

    let mut config = match HalConfig::load_or_default(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load {}: {}", args.config.display(), e);
            return ExitCode::FAILURE;
        }
    };
    if args.mock {
        config.backend = BackendKind::Mock;
    }

    let hal = match DynVlanHal::from_config(&config) {
        Ok(hal) => hal,
        Err(e) => {
            error!("Failed to initialize VLAN HAL: {}", e);
            return ExitCode::FAILURE;
        }
    };
    info!("Running {:?}", args.command);

    match run(&hal, args.command, args.json).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("vlan-hal: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
