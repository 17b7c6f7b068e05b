// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command-line arguments.

use crate::settings::SETTINGS_FILE_NAME;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shading-network conversion over RON scene files
#[derive(Parser, Debug)]
#[command(name = "nodeflow", version)]
pub struct Cli {
    /// Settings file
    #[arg(long, global = true, default_value = SETTINGS_FILE_NAME)]
    pub settings: PathBuf,

    /// Command to run
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the convertible materials in a scene.
    Scan(ScanArgs),
    /// Suggest a target schema and material for a scene.
    Suggest(SelectArgs),
    /// Plan a transfer and report validation issues without changing anything.
    Validate(TransferArgs),
    /// Plan, validate and execute a transfer.
    Transfer(TransferArgs),
    /// Convert the network behind one node for a schema.
    Convert(ConvertArgs),
    /// Show or dump the conversion tables.
    Catalog(CatalogArgs),
    /// Write a settings file holding the defaults.
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Arguments of `scan`
#[derive(Parser, Debug)]
pub struct ScanArgs {
    /// Scene file (RON)
    pub scene: PathBuf,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// A scene and an optional material selection
#[derive(Parser, Debug)]
pub struct SelectArgs {
    /// Scene file (RON)
    pub scene: PathBuf,

    /// Source materials; every convertible material when omitted
    pub materials: Vec<String>,

    /// Also select the materials bound to this geometry node
    #[arg(long)]
    pub member: Option<String>,
}

/// Arguments of `validate` and `transfer`
#[derive(Parser, Debug)]
pub struct TransferArgs {
    /// Scene file (RON)
    pub scene: PathBuf,

    /// Source materials; every convertible material when omitted
    pub materials: Vec<String>,

    /// Also select the materials bound to this geometry node
    #[arg(long)]
    pub member: Option<String>,

    /// Target material kind (host tag, e.g. `RedshiftStandardMaterial`)
    #[arg(long)]
    pub into: Option<String>,

    /// Existing node to write into instead of creating new materials
    #[arg(long)]
    pub target: Option<String>,

    /// Execute regardless of validation issues
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Where to write the updated scene; defaults to the input file
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Arguments of `convert`
#[derive(Parser, Debug)]
pub struct ConvertArgs {
    /// Scene file (RON)
    pub scene: PathBuf,

    /// Node whose network is converted
    pub node: String,

    /// Target schema (`Redshift`, `Arnold`, `Maya`)
    #[arg(long)]
    pub schema: String,

    /// Where to write the updated scene; defaults to the input file
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Arguments of `catalog`
#[derive(Parser, Debug)]
pub struct CatalogArgs {
    /// Print a table as RON
    #[arg(long, value_enum)]
    pub dump: Option<Table>,
}

/// Conversion tables
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Table {
    /// Conversion rules and passthrough kinds
    Catalog,
    /// Semantic slot map
    Slots,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_transfer() {
        let cli = Cli::try_parse_from([
            "nodeflow",
            "transfer",
            "shot.ron",
            "M1",
            "M2",
            "--into",
            "RedshiftStandardMaterial",
            "-y",
        ])
        .unwrap();
        assert_eq!(cli.settings, PathBuf::from(SETTINGS_FILE_NAME));
        let Command::Transfer(args) = cli.command else {
            panic!("expected transfer");
        };
        assert_eq!(args.materials, vec!["M1", "M2"]);
        assert_eq!(args.into.as_deref(), Some("RedshiftStandardMaterial"));
        assert!(args.yes);
        assert!(args.target.is_none());
    }

    #[test]
    fn test_parse_catalog_dump() {
        let cli = Cli::try_parse_from(["nodeflow", "catalog", "--dump", "slots", "--settings", "a.ron"]).unwrap();
        assert_eq!(cli.settings, PathBuf::from("a.ron"));
        assert!(matches!(
            cli.command,
            Command::Catalog(CatalogArgs {
                dump: Some(Table::Slots)
            })
        ));
    }

    #[test]
    fn test_convert_requires_schema() {
        assert!(Cli::try_parse_from(["nodeflow", "convert", "shot.ron", "bump1"]).is_err());
    }
}
