// SPDX-License-Identifier: MIT OR Apache-2.0
//! Command implementations.
//!
//! Each command loads a scene document, drives the engine against the
//! in-memory graph and, for mutating commands, writes the scene back.

use crate::cli::{CatalogArgs, Command, ConvertArgs, ScanArgs, SelectArgs, Table, TransferArgs};
use crate::error::CliError;
use crate::settings::NodeFlowSettings;
use nodeflow_convert::{
    available_materials, create_default_catalog, create_default_slot_map, materials_of_member,
    scene_materials, suggest_target, ConversionCatalog, ConversionEngine, Schema, SlotMap,
    TransferReport, TransferRun,
};
use nodeflow_convert::scene::shading_groups_of;
use nodeflow_graph::{create_default_registry, MaterialKind, NodeRef, SceneGraph, SceneGraphAdapter};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Run one command. `settings_path` is where `settings` came from.
pub fn run(command: Command, settings: &NodeFlowSettings, settings_path: &Path) -> Result<(), CliError> {
    match command {
        Command::Init { force } => init(settings_path, force),
        Command::Scan(args) => scan(&args),
        Command::Suggest(args) => suggest(&args),
        Command::Validate(args) => validate(&args, settings),
        Command::Transfer(args) => transfer(&args, settings),
        Command::Convert(args) => convert(&args, settings),
        Command::Catalog(args) => catalog(&args, settings),
    }
}

// ============================================================================
// Loading
// ============================================================================

fn read(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn load_scene(path: &Path) -> Result<SceneGraph, CliError> {
    let graph = SceneGraph::from_ron(&read(path)?, create_default_registry())?;
    tracing::debug!("Loaded {} nodes from {}", graph.node_count(), path.display());
    Ok(graph)
}

fn save_scene(graph: &SceneGraph, path: &Path) -> Result<(), CliError> {
    std::fs::write(path, graph.to_ron()?).map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!("Wrote {}", path.display());
    Ok(())
}

/// Engine over the built-in tables or the overrides named in `settings`
pub fn load_engine(settings: &NodeFlowSettings) -> Result<ConversionEngine, CliError> {
    let catalog = match &settings.catalog_path {
        Some(path) => ConversionCatalog::from_ron(&read(path)?)?,
        None => create_default_catalog(),
    };
    let slots = match &settings.slot_map_path {
        Some(path) => SlotMap::from_ron(&read(path)?)?,
        None => create_default_slot_map(),
    };
    Ok(ConversionEngine::with_tables(catalog, slots))
}

/// The named materials, plus those bound to `member`. Every convertible
/// material when neither is given.
pub fn select_materials(graph: &SceneGraph, names: &[String], member: Option<&str>) -> Result<Vec<NodeRef>, CliError> {
    let mut selected = Vec::new();
    if let Some(member) = member {
        let member_ref = NodeRef::from(member);
        if !graph.node_exists(&member_ref) {
            return Err(CliError::UnknownNode(member.to_string()));
        }
        selected.extend(materials_of_member(graph, &member_ref));
    }
    if names.is_empty() && member.is_none() {
        return Ok(scene_materials(graph));
    }
    for name in names {
        let node = NodeRef::from(name.as_str());
        if !graph.node_exists(&node) {
            return Err(CliError::UnknownNode(name.clone()));
        }
        if !selected.contains(&node) {
            selected.push(node);
        }
    }
    Ok(selected)
}

fn target_kind(into: Option<&str>, settings: &NodeFlowSettings) -> Result<MaterialKind, CliError> {
    match into {
        Some(tag) => MaterialKind::parse(tag).ok_or_else(|| CliError::UnknownKind(tag.to_string())),
        None => Ok(settings.default_target),
    }
}

// ============================================================================
// Commands
// ============================================================================

#[derive(Serialize)]
struct ScannedMaterial {
    name: NodeRef,
    kind: String,
    members: usize,
}

fn scan(args: &ScanArgs) -> Result<(), CliError> {
    let graph = load_scene(&args.scene)?;
    let scanned: Vec<ScannedMaterial> = scene_materials(&graph)
        .into_iter()
        .map(|material| ScannedMaterial {
            kind: graph
                .node_kind(&material)
                .map(|kind| kind.as_str().to_string())
                .unwrap_or_default(),
            members: member_count(&graph, &material),
            name: material,
        })
        .collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&scanned)?);
    } else {
        for material in &scanned {
            println!("{} ({}), {} member(s)", material.name, material.kind, material.members);
        }
        println!("{} material(s)", scanned.len());
    }
    Ok(())
}

fn member_count(graph: &SceneGraph, material: &NodeRef) -> usize {
    shading_groups_of(graph, material)
        .iter()
        .filter_map(|group| graph.group_members(group).ok())
        .map(|members| members.len())
        .sum()
}

fn suggest(args: &SelectArgs) -> Result<(), CliError> {
    let graph = load_scene(&args.scene)?;
    let shaders = select_materials(&graph, &args.materials, args.member.as_deref())?;
    let (schema, kind) = suggest_target(&graph, &shaders);

    println!("{schema}: {kind}");
    let others: Vec<String> = available_materials(&graph, schema)
        .into_iter()
        .filter(|other| *other != kind)
        .map(|other| other.as_str().to_string())
        .collect();
    if !others.is_empty() {
        println!("also available: {}", others.join(", "));
    }
    Ok(())
}

fn validate(args: &TransferArgs, settings: &NodeFlowSettings) -> Result<(), CliError> {
    let engine = load_engine(settings)?;
    let graph = load_scene(&args.scene)?;
    let shaders = select_materials(&graph, &args.materials, args.member.as_deref())?;
    let kind = target_kind(args.into.as_deref(), settings)?;

    let mut run = TransferRun::plan(&engine, &graph, &shaders, kind);
    run.validate(&engine, &graph, args.target.as_deref().map(NodeRef::from))?;

    if args.json {
        let output = serde_json::json!({
            "entries": run.entries(),
            "issues": run.issues(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{} entries onto {kind}", run.entries().len());
        for issue in run.issues() {
            println!("{issue}");
        }
    }
    Ok(())
}

fn transfer(args: &TransferArgs, settings: &NodeFlowSettings) -> Result<(), CliError> {
    let engine = load_engine(settings)?;
    let mut graph = load_scene(&args.scene)?;

    let Some(report) = transfer_scene(&engine, &mut graph, args, settings)? else {
        return Ok(());
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for line in report.log.lines() {
            println!("{line}");
        }
        println!("{}", report.summary());
    }

    let out: PathBuf = args.out.clone().unwrap_or_else(|| args.scene.clone());
    save_scene(&graph, &out)
}

/// Plan, validate and, if the issues allow it, execute a transfer against
/// `graph`. Returns `None` when the run was rejected.
pub fn transfer_scene(
    engine: &ConversionEngine,
    graph: &mut SceneGraph,
    args: &TransferArgs,
    settings: &NodeFlowSettings,
) -> Result<Option<TransferReport>, CliError> {
    let shaders = select_materials(graph, &args.materials, args.member.as_deref())?;
    let kind = target_kind(args.into.as_deref(), settings)?;

    let mut run = TransferRun::plan(engine, graph, &shaders, kind);
    run.validate(engine, graph, args.target.as_deref().map(NodeRef::from))?;
    for issue in run.issues() {
        if issue.is_error() {
            tracing::error!("{issue}");
        } else {
            tracing::warn!("{issue}");
        }
    }

    let proceed = args.yes
        || if run.has_errors() {
            settings.proceed_on_error
        } else if run.has_warnings() {
            settings.proceed_on_warning
        } else {
            true
        };

    if !proceed {
        run.reject()?;
        return Ok(None);
    }
    run.accept()?;
    Ok(Some(run.execute(engine, graph)?.clone()))
}

fn convert(args: &ConvertArgs, settings: &NodeFlowSettings) -> Result<(), CliError> {
    let schema = Schema::parse(&args.schema).ok_or_else(|| CliError::UnknownSchema(args.schema.clone()))?;
    let engine = load_engine(settings)?;
    let mut graph = load_scene(&args.scene)?;

    let node = NodeRef::from(args.node.as_str());
    if !graph.node_exists(&node) {
        return Err(CliError::UnknownNode(args.node.clone()));
    }

    let (converted, session) = engine.convert_network(&mut graph, &node, schema);
    for line in session.log().lines() {
        println!("{line}");
    }
    println!("{node} -> {converted} ({} created)", session.created().len());

    let out = args.out.clone().unwrap_or_else(|| args.scene.clone());
    save_scene(&graph, &out)
}

fn init(path: &Path, force: bool) -> Result<(), CliError> {
    if path.exists() && !force {
        tracing::warn!("{} already exists; pass --force to overwrite", path.display());
        return Ok(());
    }
    NodeFlowSettings::default().save(path)?;
    tracing::info!("Wrote {}", path.display());
    Ok(())
}

fn catalog(args: &CatalogArgs, settings: &NodeFlowSettings) -> Result<(), CliError> {
    let engine = load_engine(settings)?;
    match args.dump {
        Some(Table::Catalog) => println!("{}", engine.catalog().to_ron()?),
        Some(Table::Slots) => println!("{}", engine.slots().to_ron()?),
        None => {
            println!("{} conversion rules", engine.catalog().rules().count());
            println!("{} passthrough kinds", engine.catalog().passthrough().count());
            println!("{} semantic slots", engine.slots().len());
            for schema in Schema::ALL {
                println!("{schema}: {} material kind(s)", schema.materials().len());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodeflow_graph::{AttrType, AttrValue, NodeKind, SceneNode, UtilityKind};

    fn shot() -> SceneGraph {
        let mut graph = SceneGraph::new("shot", create_default_registry());
        let material = graph.insert_node(
            SceneNode::new("M1", MaterialKind::AiStandardSurface)
                .with_input("baseColor", AttrType::Color)
                .with_value("specularRoughness", AttrValue::Float(0.35))
                .with_output("outColor", AttrType::Color),
        );
        let file = graph.spawn(UtilityKind::File, "F1").unwrap();
        graph
            .connect(&file.plug("outColor"), &material.plug("baseColor"))
            .unwrap();
        graph
    }

    fn args(into: &str) -> TransferArgs {
        TransferArgs {
            scene: PathBuf::from("shot.ron"),
            materials: Vec::new(),
            into: Some(into.to_string()),
            target: None,
            yes: false,
            member: None,
            out: None,
            json: false,
        }
    }

    #[test]
    fn test_warnings_proceed_by_default() {
        let mut graph = shot();
        let engine = ConversionEngine::new();
        let report = transfer_scene(
            &engine,
            &mut graph,
            &args("RedshiftStandardMaterial"),
            &NodeFlowSettings::default(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(report.ok_count, 2);
    }

    #[test]
    fn test_warnings_can_reject() {
        let mut graph = shot();
        let before = graph.node_count();
        let engine = ConversionEngine::new();
        let settings = NodeFlowSettings {
            proceed_on_warning: false,
            ..NodeFlowSettings::default()
        };

        let result = transfer_scene(&engine, &mut graph, &args("RedshiftStandardMaterial"), &settings).unwrap();
        assert!(result.is_none());
        assert_eq!(graph.node_count(), before);

        let forced = TransferArgs {
            yes: true,
            ..args("RedshiftStandardMaterial")
        };
        assert!(transfer_scene(&engine, &mut graph, &forced, &settings)
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_errors_block_by_default() {
        let mut graph = shot();
        let engine = ConversionEngine::new();
        let missing_target = TransferArgs {
            target: Some("nope".to_string()),
            ..args("RedshiftStandardMaterial")
        };
        let result = transfer_scene(&engine, &mut graph, &missing_target, &NodeFlowSettings::default()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_selection() {
        let mut graph = shot();
        assert_eq!(select_materials(&graph, &[], None).unwrap(), vec![NodeRef::from("M1")]);
        assert!(matches!(
            select_materials(&graph, &["M9".to_string()], None),
            Err(CliError::UnknownNode(name)) if name == "M9"
        ));
        assert!(matches!(
            target_kind(Some("notAShader"), &NodeFlowSettings::default()),
            Err(CliError::UnknownKind(_))
        ));

        let other = graph.spawn(MaterialKind::Lambert, "lambert1").unwrap();
        let group = graph.spawn(NodeKind::ShadingGroup, "lambert1SG").unwrap();
        let mesh = graph.insert_node(SceneNode::new("pCube1", "mesh"));
        graph
            .connect(&other.plug("outColor"), &group.plug("surfaceShader"))
            .unwrap();
        graph.assign_to_group(&[mesh], &group).unwrap();

        assert_eq!(
            select_materials(&graph, &["M1".to_string()], Some("pCube1")).unwrap(),
            vec![other, NodeRef::from("M1")]
        );
        assert_eq!(member_count(&graph, &NodeRef::from("lambert1")), 1);
    }
}
