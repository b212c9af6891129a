//! Integration tests for view sessions over an exported payload directory.

use lineage_graph::{LayoutMode, NodeId, RawEdge, RawGraph, RawNode, ViewStatus};
use lineage_view::config::ViewConfig;
use lineage_view::{Interaction, JsonDirectorySource, Notification, Perspective, ViewSession};
use tempfile::TempDir;

fn architecture() -> RawGraph {
    RawGraph {
        nodes: vec![
            RawNode::new("ingest", "PACKAGE"),
            RawNode::new("publish", "PACKAGE"),
        ],
        edges: vec![RawEdge::new("ip", "ingest", "publish")],
    }
}

fn ingest_package() -> RawGraph {
    RawGraph {
        nodes: vec![
            RawNode::new("ingest", "PACKAGE"),
            RawNode::new("read", "component_source").with_parent("ingest"),
            RawNode::new("clean", "component_transform").with_parent("ingest"),
            RawNode::new("write", "component_sink").with_parent("ingest"),
        ],
        edges: vec![RawEdge::new("rc", "read", "clean"), RawEdge::new("cw", "clean", "write")],
    }
}

async fn exported() -> (TempDir, JsonDirectorySource) {
    let temp = TempDir::new().unwrap();
    let source = JsonDirectorySource::new(temp.path());
    source
        .store(&Perspective::Global, &RawGraph {
            nodes: vec![RawNode::new("t", "TABLE")],
            edges: vec![],
        })
        .await
        .unwrap();
    source.store(&Perspective::Architecture, &architecture()).await.unwrap();
    source
        .store(&Perspective::Package(NodeId::new("ingest")), &ingest_package())
        .await
        .unwrap();
    (temp, source)
}

fn session() -> ViewSession {
    let config = ViewConfig::new("sol");
    ViewSession::new(config.solution_id.clone(), config.layout.clone()).with_filter(config.filter_state())
}

#[tokio::test]
async fn drill_down_through_exported_files() {
    let (_temp, source) = exported().await;
    let mut session = session();

    assert!(session.refresh(&source).await);
    assert!(session.apply(Interaction::ShowArchitecture, &source).await.unwrap());
    assert!(
        session
            .apply(Interaction::NodeClicked(NodeId::new("ingest")), &source)
            .await
            .unwrap()
    );

    let model = session.render_model();
    assert_eq!(model.status, ViewStatus::Ready);
    assert_eq!(model.nodes.len(), 4);
    let group = model.node(&NodeId::new("ingest")).unwrap();
    for child in ["read", "clean", "write"] {
        let node = model.node(&NodeId::new(child)).unwrap();
        assert_eq!(node.parent_id.as_ref(), Some(&group.id));
        assert!(node.position.x >= 0.0 && node.position.y >= 0.0);
        assert!(node.position.x + node.size.width <= group.frame.width);
        assert!(node.position.y + node.size.height <= group.frame.height);
    }

    assert!(session.apply(Interaction::ClosePackage, &source).await.unwrap());
    assert_eq!(session.perspective(), &Perspective::Architecture);
    assert!(session.drain_notifications().is_empty());
}

#[tokio::test]
async fn missing_drill_down_keeps_architecture_on_screen() {
    let (_temp, source) = exported().await;
    let mut session = session();
    session.refresh(&source).await;
    session.apply(Interaction::ShowArchitecture, &source).await.unwrap();

    let fetched = session
        .apply(Interaction::NodeClicked(NodeId::new("publish")), &source)
        .await
        .unwrap();

    assert!(!fetched);
    assert_eq!(session.perspective(), &Perspective::Architecture);
    assert_eq!(session.render_model().nodes.len(), 2);
    assert!(matches!(
        session.drain_notifications().as_slice(),
        [Notification::FetchFailed { perspective: Perspective::Package(id), .. }] if id.as_str() == "publish"
    ));
}

#[tokio::test]
async fn filters_survive_perspective_changes() {
    let (_temp, source) = exported().await;
    let mut session = session();
    session.refresh(&source).await;

    session.apply(Interaction::SetLayout(LayoutMode::Circular), &source).await.unwrap();
    session.apply(Interaction::ShowArchitecture, &source).await.unwrap();

    let model = session.render_model();
    assert_eq!(model.layout_mode, LayoutMode::Circular);
    assert!(model.nodes.iter().all(|n| n.parent_id.is_none()));
}
