//! Declarative socket contracts for every node kind.
//!
//! The registry serves two consumers: the engine's connection
//! type-checking, and host tooling (the node editor UI renders its
//! palette and sockets from the serialized registry).

use serde::Serialize;

use crate::types::{NodeKind, SocketType};

#[derive(Debug, Clone, Serialize)]
pub struct SocketSpec {
    pub id: &'static str,
    pub ty: SocketType,
    pub label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParamSpec {
    pub id: &'static str,
    pub label: &'static str,
    #[serde(default)]
    pub doc: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeSignature {
    pub kind: NodeKind,
    pub name: &'static str,
    pub inputs: Vec<SocketSpec>,
    pub outputs: Vec<SocketSpec>,
    pub params: Vec<ParamSpec>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Registry {
    pub version: &'static str,
    pub nodes: Vec<NodeSignature>,
}

fn color_in(id: &'static str, label: &'static str) -> SocketSpec {
    SocketSpec {
        id,
        ty: SocketType::Color,
        label,
    }
}

fn scalar(id: &'static str, label: &'static str) -> SocketSpec {
    SocketSpec {
        id,
        ty: SocketType::Scalar,
        label,
    }
}

fn color_out() -> SocketSpec {
    color_in("color", "Color")
}

/// The socket contract for one node kind.
pub fn signature(kind: NodeKind) -> NodeSignature {
    match kind {
        NodeKind::Webcam => NodeSignature {
            kind,
            name: "Webcam",
            inputs: vec![],
            outputs: vec![color_out()],
            params: vec![
                ParamSpec {
                    id: "offset_x",
                    label: "Offset X",
                    doc: "Horizontal sample offset in pixels.",
                },
                ParamSpec {
                    id: "offset_y",
                    label: "Offset Y",
                    doc: "Vertical sample offset in pixels.",
                },
            ],
        },
        NodeKind::Canvas => NodeSignature {
            kind,
            name: "Canvas",
            inputs: vec![color_in("color", "Color")],
            outputs: vec![],
            params: vec![],
        },
        NodeKind::Color => NodeSignature {
            kind,
            name: "Color",
            inputs: vec![],
            outputs: vec![color_out()],
            params: vec![ParamSpec {
                id: "color",
                label: "Color",
                doc: "RGBA components in the 0..1 range.",
            }],
        },
        NodeKind::Scalar => NodeSignature {
            kind,
            name: "Scalar",
            inputs: vec![],
            outputs: vec![scalar("value", "Value")],
            params: vec![ParamSpec {
                id: "value",
                label: "Value",
                doc: "",
            }],
        },
        NodeKind::Blend => NodeSignature {
            kind,
            name: "Blend Colors",
            inputs: vec![color_in("color_a", "Color A"), color_in("color_b", "Color B")],
            outputs: vec![color_out()],
            params: vec![],
        },
        NodeKind::Split => NodeSignature {
            kind,
            name: "Split Channels",
            inputs: vec![color_in("color", "Color")],
            outputs: vec![
                scalar("r", "R"),
                scalar("g", "G"),
                scalar("b", "B"),
                scalar("a", "A"),
            ],
            params: vec![],
        },
        NodeKind::Join => NodeSignature {
            kind,
            name: "Join Channels",
            inputs: vec![
                scalar("r", "R"),
                scalar("g", "G"),
                scalar("b", "B"),
                scalar("a", "A"),
            ],
            outputs: vec![color_out()],
            params: vec![],
        },
    }
}

/// Every node kind, in palette order.
pub fn registry() -> Registry {
    use NodeKind::*;
    Registry {
        version: env!("CARGO_PKG_VERSION"),
        nodes: [Canvas, Webcam, Color, Scalar, Blend, Split, Join]
            .into_iter()
            .map(signature)
            .collect(),
    }
}
