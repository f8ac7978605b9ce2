//! Articulated three-part player characters
//!
//! A player is three meshes chained through fixed tags: the lower body is
//! the root, the upper body hangs off `tag_torso`, the head off `tag_head`.
//! The torso and legs run independent clocks over independently selected
//! clips; crossfades mask every discontinuous pose change so the character
//! never visibly pops.

use std::path::Path;
use std::rc::Rc;

use glam::Mat4;
use md3::Md3Model;

use crate::action::{ActionState, Completion};
use crate::clip::{Clip, ClipSet, FramePair, Region};
use crate::crossfade::Crossfade;
use crate::error::{CharacterError, Result};
use crate::node::{self, MeshPose, NodeRef, SceneNode};

/// Default crossfade length for clip changes and one-shot transitions
pub const CLIP_FADE_SECS: f32 = 0.1;
/// Shorter fade used when swapping a mesh variant in place
pub const SWAP_FADE_SECS: f32 = 0.08;

/// Tag chaining the upper body to the lower body
pub const TAG_TORSO: &str = "tag_torso";
/// Tag chaining the head to the upper body
pub const TAG_HEAD: &str = "tag_head";
/// Tag carrying a held weapon on the upper body
pub const TAG_WEAPON: &str = "tag_weapon";

/// The three mesh parts of a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Part {
    Lower,
    Upper,
    Head,
}

impl Part {
    pub fn index(self) -> usize {
        match self {
            Self::Lower => 0,
            Self::Upper => 1,
            Self::Head => 2,
        }
    }

    pub fn file_stem(self) -> &'static str {
        match self {
            Self::Lower => "lower",
            Self::Upper => "upper",
            Self::Head => "head",
        }
    }

    /// Model filename for a variant index (0 is the base mesh)
    pub fn model_filename(self, variant: u32) -> String {
        if variant == 0 {
            format!("{}.md3", self.file_stem())
        } else {
            format!("{}_{variant}.md3", self.file_stem())
        }
    }

    /// Skin filename for a skin set, e.g. `head_default.skin`
    pub fn skin_filename(self, skin_set: &str) -> String {
        format!("{}_{skin_set}.skin", self.file_stem())
    }
}

/// Per-region playback state: selected clip, clock, crossfade, one-shots
#[derive(Debug)]
struct RegionState {
    clip: Clip,
    time: f32,
    fade: Crossfade,
    action: ActionState,
}

impl RegionState {
    fn new(clip: Clip) -> Self {
        Self {
            clip,
            time: 0.0,
            fade: Crossfade::new(),
            action: ActionState::Idle,
        }
    }

    /// The pair driving the region's node this tick
    fn effective_pair(&self) -> FramePair {
        if self.fade.is_active() {
            self.fade.frame_pair()
        } else {
            self.clip.sample(self.time)
        }
    }
}

/// An articulated player character
pub struct PlayerModel {
    lower: NodeRef,
    upper: NodeRef,
    head: NodeRef,
    clips: ClipSet,
    torso: RegionState,
    legs: RegionState,
    attachments: Vec<NodeRef>,
    ground_offset: f32,
}

impl PlayerModel {
    /// Assemble a character from its three decoded parts and clip set
    pub fn new(
        lower: Md3Model,
        upper: Md3Model,
        head: Md3Model,
        clips: ClipSet,
    ) -> Result<Self> {
        for (part, model) in [
            (Part::Lower, &lower),
            (Part::Upper, &upper),
            (Part::Head, &head),
        ] {
            if model.frames.is_empty() {
                return Err(CharacterError::EmptyPart(part));
            }
        }

        let lower = SceneNode::new(lower);
        let upper = SceneNode::new(upper);
        let head = SceneNode::new(head);

        SceneNode::attach(&upper, &lower, TAG_TORSO);
        SceneNode::attach(&head, &upper, TAG_HEAD);
        SceneNode::promote_to_root(&lower);

        let torso_clip = clips
            .default_clip(Region::Torso)
            .cloned()
            .unwrap_or_else(|| synthetic_clip(Region::Torso));
        let legs_clip = clips
            .default_clip(Region::Legs)
            .cloned()
            .unwrap_or_else(|| synthetic_clip(Region::Legs));

        let mut player = Self {
            lower,
            upper,
            head,
            clips,
            torso: RegionState::new(torso_clip),
            legs: RegionState::new(legs_clip),
            attachments: Vec::new(),
            ground_offset: 0.0,
        };
        player.recompute_ground_offset();

        Ok(player)
    }

    /// Load the three base meshes and the clip directory from one model
    /// directory
    pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();

        let lower = Md3Model::load(dir.join(Part::Lower.model_filename(0)))?;
        let upper = Md3Model::load(dir.join(Part::Upper.model_filename(0)))?;
        let head = Md3Model::load(dir.join(Part::Head.model_filename(0)))?;
        let clips = ClipSet::load(dir.join("animation.cfg"));

        Self::new(lower, upper, head, clips)
    }

    /// Select a region's clip by name; unknown names are ignored
    ///
    /// The region crossfades from its current pose into the new clip's
    /// first frame, and its clock restarts.
    pub fn select_clip(&mut self, region: Region, name: &str) {
        let Some(clip) = self.clips.get(region, name).cloned() else {
            log::warn!("unknown {region:?} clip '{name}' ignored");
            return;
        };

        let from = self.node_for(region).borrow().pose().frame_a;
        let state = self.region_mut(region);
        if state.clip.name == clip.name {
            return;
        }

        let to = clip.first_frame;
        state.clip = clip;
        state.time = 0.0;
        state.action = ActionState::Idle;
        state.fade.cancel();
        state.fade.start(from, to, CLIP_FADE_SECS);
    }

    /// Play a non-looping clip once, then resume the region's base clip
    ///
    /// A request made while another one-shot is playing queues behind it and
    /// starts from that one's last frame (jump chaining into land).
    pub fn play_one_shot(&mut self, region: Region, name: &str) {
        let Some(clip) = self.clips.get(region, name).cloned() else {
            log::warn!("unknown {region:?} one-shot '{name}' ignored");
            return;
        };

        let from = self.node_for(region).borrow().pose().frame_a;
        let state = self.region_mut(region);
        let was_idle = state.action == ActionState::Idle;
        let base = state.clip.name.clone();
        state.action = state.action.clone().play(name, &base);

        if was_idle {
            let to = clip.first_frame;
            state.clip = clip;
            state.time = 0.0;
            state.fade.cancel();
            state.fade.start(from, to, CLIP_FADE_SECS);
        }
    }

    /// Begin a crossfade on a region, replacing any in-flight fade
    pub fn start_crossfade(&mut self, region: Region, from: u32, to: u32, duration: f32) {
        let state = self.region_mut(region);
        state.fade.cancel();
        state.fade.start(from, to, duration);
    }

    /// Advance clocks, crossfades and one-shots, then recompute every node
    /// transform parent-before-child
    pub fn tick(&mut self, dt: f32) {
        self.tick_region(Region::Torso, dt);
        self.tick_region(Region::Legs, dt);

        let torso_pair = self.torso.effective_pair();
        let legs_pair = self.legs.effective_pair();

        self.upper.borrow_mut().set_pose(torso_pair);
        self.lower.borrow_mut().set_pose(legs_pair);
        // The format has no head animation; the head holds its single pose
        self.head.borrow_mut().set_pose(FramePair {
            frame_a: 0,
            frame_b: 0,
            blend: 0.0,
        });

        // Attached objects follow the upper body's pair wrapped into their
        // own frame range
        for attachment in &self.attachments {
            let count = attachment.borrow().model().frame_count() as u32;
            let pose = if count > 0 {
                FramePair {
                    frame_a: torso_pair.frame_a % count,
                    frame_b: torso_pair.frame_b % count,
                    blend: torso_pair.blend,
                }
            } else {
                FramePair {
                    frame_a: 0,
                    frame_b: 0,
                    blend: 0.0,
                }
            };
            attachment.borrow_mut().set_pose(pose);
        }

        node::update_transforms(&self.lower, None);
    }

    fn tick_region(&mut self, region: Region, dt: f32) {
        {
            let state = self.region_mut(region);
            state.fade.tick(dt);
            // A clock held by an active crossfade resumes the same tick the
            // fade ends
            if !state.fade.is_active() {
                state.time += dt;
            }
        }

        let finished = {
            let state = self.region_ref(region);
            state.action.playing().is_some()
                && state.clip.loop_frames == 0
                && state.time >= state.clip.play_time()
        };
        if !finished {
            return;
        }

        let (action, completion, last_frame) = {
            let state = self.region_ref(region);
            let last = state.clip.first_frame + state.clip.num_frames.max(1) - 1;
            let (action, completion) = state.action.clone().complete();
            (action, completion, last)
        };

        let next_name = match completion {
            Completion::Chain(name) | Completion::Resume(name) => Some(name),
            Completion::None => None,
        };
        let next_clip = next_name
            .as_deref()
            .and_then(|name| self.clips.get(region, name).cloned());

        let state = self.region_mut(region);
        state.action = action;
        match (next_clip, next_name) {
            (Some(clip), _) => {
                state.fade.cancel();
                state.fade.start(last_frame, clip.first_frame, CLIP_FADE_SECS);
                state.clip = clip;
                state.time = 0.0;
            }
            (None, Some(name)) => {
                log::warn!("follow-up clip '{name}' not found; holding last frame");
            }
            (None, None) => {}
        }
    }

    /// Replace one part's mesh with a new variant, preserving the pose
    ///
    /// The swap is an atomic pointer exchange plus a same-frame crossfade,
    /// so the new mesh settles in without a visible pop. Swapping the lower
    /// body recomputes the ground offset for the new geometry.
    pub fn swap_variant(&mut self, part: Part, model: Md3Model) -> Result<()> {
        if model.frames.is_empty() {
            return Err(CharacterError::EmptyPart(part));
        }
        let model = Rc::new(model);

        match part {
            Part::Upper => {
                let pose = self.upper.borrow().pose().frame_a;
                self.torso.fade.cancel();
                self.torso.fade.start(pose, pose, SWAP_FADE_SECS);
                let mut upper = self.upper.borrow_mut();
                upper.set_model(model);
                upper.set_pose(FramePair {
                    frame_a: pose,
                    frame_b: pose,
                    blend: 0.0,
                });
            }
            Part::Lower => {
                let pose = self.lower.borrow().pose().frame_a;
                self.legs.fade.cancel();
                self.legs.fade.start(pose, pose, SWAP_FADE_SECS);
                {
                    let mut lower = self.lower.borrow_mut();
                    lower.set_model(model);
                    lower.set_pose(FramePair {
                        frame_a: pose,
                        frame_b: pose,
                        blend: 0.0,
                    });
                }
                self.recompute_ground_offset();
            }
            Part::Head => {
                self.head.borrow_mut().set_model(model);
            }
        }

        Ok(())
    }

    /// Attach an external node (weapon, effect) at a named tag
    ///
    /// The node goes to whichever part's mesh carries the tag; if none does,
    /// it hangs off the upper body and resolves to identity until a mesh
    /// with the tag is swapped in.
    pub fn attach(&mut self, node: NodeRef, tag_name: &str) {
        let owner = [&self.lower, &self.upper, &self.head]
            .into_iter()
            .find(|part| part.borrow().model().tag(0, tag_name).is_some())
            .cloned()
            .unwrap_or_else(|| {
                log::warn!("no part carries tag '{tag_name}'; attaching to the upper mesh");
                Rc::clone(&self.upper)
            });

        SceneNode::attach(&node, &owner, tag_name);
        self.attachments.push(node);
    }

    /// Detach a previously attached node; the node itself stays alive
    pub fn detach(&mut self, node: &NodeRef) {
        SceneNode::detach(node);
        self.attachments.retain(|n| !Rc::ptr_eq(n, node));
    }

    /// World transform of a named tag at the current blended pose
    ///
    /// Used by external consumers placing objects at attachment points
    /// (projectile spawns, muzzle flashes). Valid after [`PlayerModel::tick`].
    pub fn tag_world_transform(&self, tag_name: &str) -> Option<Mat4> {
        for part in [&self.lower, &self.upper, &self.head] {
            let node = part.borrow();
            if let Some(local) = node.blended_tag(tag_name) {
                return Some(node.world() * local);
            }
        }
        None
    }

    /// Externally supplied root placement (e.g. yaw from a controller)
    pub fn set_placement(&mut self, placement: Mat4) {
        self.lower.borrow_mut().set_placement(placement);
    }

    /// Render poses for every part and attachment, parent before child
    pub fn poses(&self) -> Vec<MeshPose> {
        let mut out = Vec::new();
        node::collect_poses(&self.lower, &mut out);
        out
    }

    pub fn clips(&self) -> &ClipSet {
        &self.clips
    }

    /// The clip currently driving a region
    pub fn selected_clip(&self, region: Region) -> &Clip {
        &self.region_ref(region).clip
    }

    /// A region's animation clock in seconds
    pub fn clock(&self, region: Region) -> f32 {
        self.region_ref(region).time
    }

    pub fn crossfade_active(&self, region: Region) -> bool {
        self.region_ref(region).fade.is_active()
    }

    /// Vertical offset keeping the idle pose's feet on the ground plane
    pub fn ground_offset(&self) -> f32 {
        self.ground_offset
    }

    /// Node handle for one part (for wiring external systems)
    pub fn part_node(&self, part: Part) -> NodeRef {
        match part {
            Part::Lower => Rc::clone(&self.lower),
            Part::Upper => Rc::clone(&self.upper),
            Part::Head => Rc::clone(&self.head),
        }
    }

    /// Ground offset comes from the legs idle clip's lowest bound so the
    /// feet sit on the reference plane regardless of mesh-variant geometry
    fn recompute_ground_offset(&mut self) {
        let idle = self
            .clips
            .get(Region::Legs, "LEGS_IDLE")
            .unwrap_or(&self.legs.clip)
            .clone();

        let lower_model = self.lower.borrow().model();
        let start = idle.first_frame as usize;
        let end = start + idle.num_frames.max(1) as usize;

        let mut min_z = f32::INFINITY;
        for frame in start..end {
            let z = lower_model.min_bounds_z(frame);
            if z.is_finite() && z < min_z {
                min_z = z;
            }
        }
        if !min_z.is_finite() {
            min_z = lower_model.min_bounds_z(0);
        }
        if !min_z.is_finite() {
            min_z = 0.0;
        }

        self.ground_offset = -min_z;
        self.lower.borrow_mut().set_ground_offset(self.ground_offset);
    }

    fn region_mut(&mut self, region: Region) -> &mut RegionState {
        match region {
            Region::Torso => &mut self.torso,
            Region::Legs => &mut self.legs,
        }
    }

    fn region_ref(&self, region: Region) -> &RegionState {
        match region {
            Region::Torso => &self.torso,
            Region::Legs => &self.legs,
        }
    }

    fn node_for(&self, region: Region) -> &NodeRef {
        match region {
            Region::Torso => &self.upper,
            Region::Legs => &self.lower,
        }
    }
}

fn synthetic_clip(region: Region) -> Clip {
    let name = match region {
        Region::Torso => "TORSO_STAND",
        Region::Legs => "LEGS_IDLE",
    };
    Clip {
        name: name.to_string(),
        first_frame: 0,
        num_frames: 1,
        loop_frames: 0,
        fps: 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn part_filenames() {
        assert_eq!(Part::Lower.model_filename(0), "lower.md3");
        assert_eq!(Part::Head.model_filename(2), "head_2.md3");
        assert_eq!(Part::Upper.skin_filename("default"), "upper_default.skin");
        assert_eq!(Part::Upper.skin_filename("blue"), "upper_blue.skin");
    }

    #[test]
    fn synthetic_clips_are_single_frame() {
        let clip = synthetic_clip(Region::Legs);
        assert_eq!(clip.name, "LEGS_IDLE");
        assert_eq!(clip.num_frames, 1);
        assert_eq!(clip.sample(9.0).frame_a, 0);
    }
}
