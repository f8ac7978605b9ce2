//! Tag-hierarchy scene graph
//!
//! Each node owns one mesh and hangs off its parent through a named tag.
//! A parent's blended tag transform (interpolated between the parent's two
//! current frames) becomes the child's local transform, so chained parts
//! follow the parent's animation without their own skeleton. The root node
//! instead composes a ground offset, a fixed axis re-orientation, and an
//! externally supplied placement transform.

use std::cell::RefCell;
use std::f32::consts::FRAC_PI_2;
use std::rc::{Rc, Weak};

use glam::{Mat4, Vec3};
use md3::{Md3Model, Tag};

use crate::clip::FramePair;

/// Shared handle to a scene node
pub type NodeRef = Rc<RefCell<SceneNode>>;

/// Re-orientation from model space (z up, y forward) to world space
/// (y up, z forward): -90 degrees about x
pub fn base_orientation() -> Mat4 {
    Mat4::from_rotation_x(-FRAC_PI_2)
}

/// Everything a renderer needs for one mesh: the frame pair, the blend
/// weight, and the world transform
#[derive(Debug, Clone)]
pub struct MeshPose {
    pub model: Rc<Md3Model>,
    pub frame_a: u32,
    pub frame_b: u32,
    pub blend: f32,
    pub world: Mat4,
}

/// One node of the tag hierarchy
#[derive(Debug)]
pub struct SceneNode {
    model: Rc<Md3Model>,
    parent: Weak<RefCell<SceneNode>>,
    tag_name: String,
    children: Vec<NodeRef>,
    frame_a: u32,
    frame_b: u32,
    blend: f32,
    local: Mat4,
    world: Mat4,
    base: Mat4,
    placement: Mat4,
    ground_offset: f32,
}

impl SceneNode {
    /// Create a detached node owning the given mesh
    pub fn new(model: Md3Model) -> NodeRef {
        Self::from_shared(Rc::new(model))
    }

    /// Create a detached node sharing an already decoded mesh
    pub fn from_shared(model: Rc<Md3Model>) -> NodeRef {
        Rc::new(RefCell::new(Self {
            model,
            parent: Weak::new(),
            tag_name: String::new(),
            children: Vec::new(),
            frame_a: 0,
            frame_b: 0,
            blend: 0.0,
            local: Mat4::IDENTITY,
            world: Mat4::IDENTITY,
            base: Mat4::IDENTITY,
            placement: Mat4::IDENTITY,
            ground_offset: 0.0,
        }))
    }

    /// Attach `child` to `parent` through the named tag
    ///
    /// The child is detached from any previous parent first. Attaching a
    /// node to itself is ignored.
    pub fn attach(child: &NodeRef, parent: &NodeRef, tag_name: &str) {
        if Rc::ptr_eq(child, parent) {
            log::warn!("ignoring attempt to attach a node to itself");
            return;
        }

        Self::detach(child);

        {
            let mut node = child.borrow_mut();
            node.parent = Rc::downgrade(parent);
            node.tag_name = tag_name.to_string();
        }
        parent.borrow_mut().children.push(Rc::clone(child));
    }

    /// Detach a node from its parent, clearing the back-reference
    ///
    /// The node itself stays alive; only the link is removed.
    pub fn detach(child: &NodeRef) {
        let parent = child.borrow().parent.upgrade();
        if let Some(parent) = parent {
            parent
                .borrow_mut()
                .children
                .retain(|node| !Rc::ptr_eq(node, child));
        }

        let mut node = child.borrow_mut();
        node.parent = Weak::new();
        node.tag_name.clear();
    }

    /// Detach and install the fixed model-to-world axis correction,
    /// making this node the root of its hierarchy
    pub fn promote_to_root(node: &NodeRef) {
        Self::detach(node);
        node.borrow_mut().base = base_orientation();
    }

    /// Replace the owned mesh (mesh-variant swap); the node keeps its
    /// frames, children and transforms
    pub fn set_model(&mut self, model: Rc<Md3Model>) {
        self.model = model;
    }

    pub fn model(&self) -> Rc<Md3Model> {
        Rc::clone(&self.model)
    }

    pub fn set_pose(&mut self, pair: FramePair) {
        self.frame_a = pair.frame_a;
        self.frame_b = pair.frame_b;
        self.blend = pair.blend;
    }

    pub fn pose(&self) -> FramePair {
        FramePair {
            frame_a: self.frame_a,
            frame_b: self.frame_b,
            blend: self.blend,
        }
    }

    /// World-space vertical offset applied to the root
    pub fn set_ground_offset(&mut self, y: f32) {
        self.ground_offset = y;
    }

    /// Externally supplied placement (e.g. character yaw); root only
    pub fn set_placement(&mut self, placement: Mat4) {
        self.placement = placement;
    }

    pub fn world(&self) -> Mat4 {
        self.world
    }

    pub fn local(&self) -> Mat4 {
        self.local
    }

    pub fn tag_name(&self) -> &str {
        &self.tag_name
    }

    pub fn has_parent(&self) -> bool {
        self.parent.strong_count() > 0
    }

    /// The named tag of the owned mesh at this node's current frame pair
    ///
    /// When both frames carry the tag, the origin and the three axis vectors
    /// are interpolated independently and the basis is re-orthonormalized to
    /// avoid shear. When only one frame has it, that frame's transform is
    /// used as is.
    pub fn blended_tag(&self, tag_name: &str) -> Option<Mat4> {
        let tag_a = self.model.tag(self.frame_a as usize, tag_name);
        let tag_b = self.model.tag(self.frame_b as usize, tag_name);

        match (tag_a, tag_b) {
            (Some(a), Some(b)) => Some(lerp_tags(a, b, self.blend)),
            (Some(tag), None) | (None, Some(tag)) => Some(tag.to_mat4()),
            (None, None) => None,
        }
    }
}

/// Recompute `local` and `world` for a subtree, strictly parent before child
///
/// Called once per tick from the root; nothing is cached across ticks
/// because frame pairs and blends change continuously.
pub fn update_transforms(node: &NodeRef, parent_world: Option<Mat4>) {
    let local = {
        let n = node.borrow();
        match n.parent.upgrade() {
            Some(parent) if !n.tag_name.is_empty() => {
                let parent = parent.borrow();
                parent.blended_tag(&n.tag_name).unwrap_or(Mat4::IDENTITY)
            }
            Some(_) => Mat4::IDENTITY,
            None => {
                Mat4::from_translation(Vec3::new(0.0, n.ground_offset, 0.0))
                    * n.base
                    * n.placement
            }
        }
    };

    let world = parent_world.map_or(local, |parent_world| parent_world * local);

    let children: Vec<NodeRef> = {
        let mut n = node.borrow_mut();
        n.local = local;
        n.world = world;
        n.children.clone()
    };

    for child in &children {
        update_transforms(child, Some(world));
    }
}

/// Collect render poses for a subtree in parent-before-child order
pub fn collect_poses(node: &NodeRef, out: &mut Vec<MeshPose>) {
    let children: Vec<NodeRef> = {
        let n = node.borrow();
        out.push(MeshPose {
            model: Rc::clone(&n.model),
            frame_a: n.frame_a,
            frame_b: n.frame_b,
            blend: n.blend,
            world: n.world,
        });
        n.children.clone()
    };

    for child in &children {
        collect_poses(child, out);
    }
}

fn normalize_or(v: Vec3, fallback: Vec3) -> Vec3 {
    let len = v.length();
    if len > 1e-8 { v / len } else { fallback }
}

/// Gram-Schmidt re-orthonormalization of a lerped basis
fn orthonormalize_basis(x: Vec3, y: Vec3, z: Vec3) -> (Vec3, Vec3, Vec3) {
    let x = normalize_or(x, Vec3::Z);
    let mut z = normalize_or(z, Vec3::ZERO);
    if z.length_squared() < 1e-12 {
        z = normalize_or(x.cross(y), Vec3::Z);
    }
    let y = normalize_or(z.cross(x), Vec3::Y);
    let z = normalize_or(x.cross(y), Vec3::Z);

    (x, y, z)
}

fn lerp_tags(a: &Tag, b: &Tag, t: f32) -> Mat4 {
    let origin = a.origin.to_glam().lerp(b.origin.to_glam(), t);
    let x = a.x_axis.to_glam().lerp(b.x_axis.to_glam(), t);
    let y = a.y_axis.to_glam().lerp(b.y_axis.to_glam(), t);
    let z = a.z_axis.to_glam().lerp(b.z_axis.to_glam(), t);

    let (x, y, z) = orthonormalize_basis(x, y, z);

    Mat4::from_cols(
        x.extend(0.0),
        y.extend(0.0),
        z.extend(0.0),
        origin.extend(1.0),
    )
}
