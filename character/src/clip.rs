//! Clip directory parsing and animation-time evaluation
//!
//! An `animation.cfg` lists every clip of a player model as four integers
//! per line (first frame, frame count, loop count, fps), named implicitly by
//! a fixed order: six BOTH_ death clips shared by both body halves, then the
//! TORSO_ clips of the upper mesh, then the LEGS_ clips of the lower mesh.
//! Frame numbers are written in one continuous upper-mesh-relative sequence,
//! so every LEGS_ clip is rebased by the total TORSO_ frame count before it
//! can index the lower mesh.

use std::fs;
use std::path::Path;

/// Fixed clip name order of the directory file
pub const CLIP_ORDER: [&str; 25] = [
    // BOTH
    "BOTH_DEATH1",
    "BOTH_DEAD1",
    "BOTH_DEATH2",
    "BOTH_DEAD2",
    "BOTH_DEATH3",
    "BOTH_DEAD3",
    // TORSO
    "TORSO_GESTURE",
    "TORSO_ATTACK",
    "TORSO_ATTACK2",
    "TORSO_DROP",
    "TORSO_RAISE",
    "TORSO_STAND",
    "TORSO_STAND2",
    // LEGS
    "LEGS_WALKCR",
    "LEGS_WALK",
    "LEGS_RUN",
    "LEGS_BACK",
    "LEGS_SWIM",
    "LEGS_JUMP",
    "LEGS_LAND",
    "LEGS_JUMPB",
    "LEGS_LANDB",
    "LEGS_IDLE",
    "LEGS_IDLECR",
    "LEGS_TURN",
];

/// The two independently clocked body regions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    /// Upper mesh (torso, arms)
    Torso,
    /// Lower mesh (legs)
    Legs,
}

/// A named, time-parameterized animation sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clip {
    pub name: String,
    /// First frame in the owning mesh's frame space
    pub first_frame: u32,
    pub num_frames: u32,
    /// Zero means clamp at the last frame; otherwise the final `loop_frames`
    /// frames form a cycle entered after the first pass
    pub loop_frames: u32,
    pub fps: u32,
}

/// Two source frames and the blend weight between them
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FramePair {
    pub frame_a: u32,
    pub frame_b: u32,
    pub blend: f32,
}

impl Clip {
    /// Map elapsed seconds to a frame pair and blend factor
    ///
    /// Non-looping clips play through once and then freeze on the last frame.
    /// Looping clips play straight through once, with `frame_b` wrapping to
    /// the loop start exactly at the seam, then cycle inside the final
    /// `loop_frames` frames forever. The asymmetry is format behavior and is
    /// preserved exactly.
    pub fn sample(&self, elapsed_secs: f32) -> FramePair {
        let fps = self.fps.max(1) as f32;
        let total = self.num_frames.max(1);

        let f_exact = elapsed_secs.max(0.0) * fps;
        let i = f_exact.floor() as u32;
        let frac = f_exact - f_exact.floor();

        let first = self.first_frame;
        let last = total - 1;

        if self.loop_frames == 0 {
            if i >= last || total == 1 {
                let frame = first + last;
                return FramePair {
                    frame_a: frame,
                    frame_b: frame,
                    blend: 0.0,
                };
            }
            return FramePair {
                frame_a: first + i,
                frame_b: first + i + 1,
                blend: frac,
            };
        }

        let loop_frames = self.loop_frames.clamp(1, total);
        let loop_start = total - loop_frames;

        if i <= last {
            // Initial pass includes the last frame; frame_b wraps at the seam
            let frame_b = if i < last {
                first + i + 1
            } else {
                first + loop_start
            };
            FramePair {
                frame_a: first + i,
                frame_b,
                blend: frac,
            }
        } else {
            // Past the seam, index within the loop subset only
            let k = (i - last - 1) % loop_frames;
            FramePair {
                frame_a: first + loop_start + k,
                frame_b: first + loop_start + (k + 1) % loop_frames,
                blend: frac,
            }
        }
    }

    /// Seconds until a non-looping clip reaches its held last frame
    pub fn play_time(&self) -> f32 {
        let fps = self.fps.max(1) as f32;
        (self.num_frames.max(1) - 1) as f32 / fps
    }
}

fn is_directive(word: &str) -> bool {
    matches!(
        word.to_ascii_lowercase().as_str(),
        "sex" | "headoffset" | "footsteps"
    )
}

/// Which mesh frame spaces a clip belongs to, by name prefix
#[derive(PartialEq, Eq, Clone, Copy)]
enum ClipKind {
    Both,
    Torso,
    Legs,
}

fn clip_kind(name: &str) -> ClipKind {
    if name.starts_with("TORSO_") {
        ClipKind::Torso
    } else if name.starts_with("LEGS_") {
        ClipKind::Legs
    } else {
        ClipKind::Both
    }
}

/// The parsed clip directory, split into the two mesh frame spaces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipSet {
    torso: Vec<Clip>,
    legs: Vec<Clip>,
    torso_names: Vec<String>,
    legs_names: Vec<String>,
}

impl ClipSet {
    /// Parse clip directory text
    ///
    /// Unusable input falls back to a single synthetic one-frame clip per
    /// region so the character is always renderable.
    pub fn parse(text: &str) -> Self {
        let mut raw: Vec<[i64; 4]> = Vec::new();

        for line in text.lines() {
            let line = line.split("//").next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }

            let first_word = line.split_whitespace().next().unwrap_or("");
            if is_directive(first_word) {
                continue;
            }

            let fields: Vec<i64> = line
                .split_whitespace()
                .take(4)
                .filter_map(|word| word.parse().ok())
                .collect();
            if fields.len() < 4 {
                continue;
            }

            raw.push([fields[0], fields[1], fields[2], fields[3]]);
            if raw.len() >= CLIP_ORDER.len() {
                break;
            }
        }

        if raw.is_empty() {
            log::warn!("clip directory contained no usable entries; using fallback");
            return Self::fallback();
        }

        let named: Vec<(&str, [i64; 4])> = CLIP_ORDER
            .iter()
            .copied()
            .zip(raw.into_iter())
            .collect();

        // Upper-mesh frame numbers run [BOTH + TORSO]; the lower mesh runs
        // [BOTH + LEGS], so LEGS_ first frames shift down by the TORSO total
        let torso_total: i64 = named
            .iter()
            .filter(|(name, _)| clip_kind(name) == ClipKind::Torso)
            .map(|(_, fields)| fields[1].max(0))
            .sum();

        let make_clip = |name: &str, fields: [i64; 4], first_frame: i64| Clip {
            name: name.to_string(),
            first_frame: first_frame.max(0) as u32,
            num_frames: fields[1].max(0) as u32,
            loop_frames: fields[2].max(0) as u32,
            fps: fields[3].max(0) as u32,
        };

        let mut torso = Vec::new();
        let mut legs = Vec::new();
        for &(name, fields) in &named {
            match clip_kind(name) {
                ClipKind::Both => {
                    torso.push(make_clip(name, fields, fields[0]));
                    legs.push(make_clip(name, fields, fields[0]));
                }
                ClipKind::Torso => torso.push(make_clip(name, fields, fields[0])),
                ClipKind::Legs => legs.push(make_clip(name, fields, fields[0] - torso_total)),
            }
        }

        let torso_names: Vec<String> = torso.iter().map(|clip| clip.name.clone()).collect();
        let legs_names: Vec<String> = legs.iter().map(|clip| clip.name.clone()).collect();

        let mut set = Self {
            torso,
            legs,
            torso_names,
            legs_names,
        };
        set.alias_missing_defaults();

        set
    }

    /// Load and parse a clip directory, falling back if unreadable
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(text) => Self::parse(&text),
            Err(err) => {
                log::warn!(
                    "clip directory {} not readable ({err}); using fallback",
                    path.as_ref().display()
                );
                Self::fallback()
            }
        }
    }

    /// Synthetic one-frame stand/idle clips
    pub fn fallback() -> Self {
        let stand = Clip {
            name: "TORSO_STAND".to_string(),
            first_frame: 0,
            num_frames: 1,
            loop_frames: 0,
            fps: 1,
        };
        let idle = Clip {
            name: "LEGS_IDLE".to_string(),
            first_frame: 0,
            num_frames: 1,
            loop_frames: 0,
            fps: 1,
        };

        Self {
            torso_names: vec![stand.name.clone()],
            legs_names: vec![idle.name.clone()],
            torso: vec![stand],
            legs: vec![idle],
        }
    }

    /// Short clip files may omit the standing defaults; alias them to the
    /// best available clip so lookups always succeed
    fn alias_missing_defaults(&mut self) {
        if self.get(Region::Torso, "TORSO_STAND").is_none() {
            let alt = self
                .torso
                .iter()
                .find(|clip| clip.name.starts_with("TORSO_"))
                .or_else(|| self.torso.iter().find(|clip| clip.name.starts_with("BOTH_")))
                .or_else(|| self.torso.first())
                .cloned();
            if let Some(alt) = alt {
                self.torso.push(Clip {
                    name: "TORSO_STAND".to_string(),
                    ..alt
                });
            }
        }

        if self.get(Region::Legs, "LEGS_IDLE").is_none() {
            let alt = self
                .legs
                .iter()
                .find(|clip| clip.name.starts_with("LEGS_"))
                .or_else(|| self.legs.iter().find(|clip| clip.name.starts_with("BOTH_")))
                .or_else(|| self.legs.first())
                .cloned();
            if let Some(alt) = alt {
                self.legs.push(Clip {
                    name: "LEGS_IDLE".to_string(),
                    ..alt
                });
            }
        }
    }

    /// Look up a clip in the given region's frame space
    pub fn get(&self, region: Region, name: &str) -> Option<&Clip> {
        let clips = match region {
            Region::Torso => &self.torso,
            Region::Legs => &self.legs,
        };
        clips.iter().find(|clip| clip.name == name)
    }

    /// Clip names available to a region, in declaration order
    pub fn names(&self, region: Region) -> &[String] {
        match region {
            Region::Torso => &self.torso_names,
            Region::Legs => &self.legs_names,
        }
    }

    /// The region's standing/idle default clip
    pub fn default_clip(&self, region: Region) -> Option<&Clip> {
        let default_name = match region {
            Region::Torso => "TORSO_STAND",
            Region::Legs => "LEGS_IDLE",
        };
        self.get(region, default_name).or_else(|| match region {
            Region::Torso => self.torso.first(),
            Region::Legs => self.legs.first(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn clamp_clip() -> Clip {
        Clip {
            name: "TORSO_ATTACK".to_string(),
            first_frame: 10,
            num_frames: 5,
            loop_frames: 0,
            fps: 10,
        }
    }

    fn loop_clip() -> Clip {
        Clip {
            name: "LEGS_RUN".to_string(),
            first_frame: 100,
            num_frames: 10,
            loop_frames: 5,
            fps: 10,
        }
    }

    #[test_case(0.0, 10, 11, 0.0; "start")]
    #[test_case(0.35, 13, 14, 0.5; "mid frame")]
    #[test_case(0.39, 13, 14, 0.9; "late in frame")]
    #[test_case(0.4, 14, 14, 0.0; "reaches last frame")]
    #[test_case(1.0, 14, 14, 0.0; "clamped past end")]
    #[test_case(100.0, 14, 14, 0.0; "clamped far past end")]
    fn clamp_clip_samples(t: f32, frame_a: u32, frame_b: u32, blend: f32) {
        let pair = clamp_clip().sample(t);
        assert_eq!(pair.frame_a, frame_a);
        assert_eq!(pair.frame_b, frame_b);
        assert!((pair.blend - blend).abs() < 1e-4, "blend {}", pair.blend);
    }

    #[test]
    fn single_frame_clip_holds() {
        let clip = Clip {
            name: "LEGS_IDLE".to_string(),
            first_frame: 7,
            num_frames: 1,
            loop_frames: 0,
            fps: 15,
        };

        for t in [0.0, 0.01, 5.0] {
            let pair = clip.sample(t);
            assert_eq!((pair.frame_a, pair.frame_b), (7, 7));
            assert_eq!(pair.blend, 0.0);
        }
    }

    #[test_case(0.85, 108, 109, 0.5; "initial pass")]
    #[test_case(0.91, 109, 105, 0.1; "frame_b wraps at the seam")]
    #[test_case(0.95, 109, 105, 0.5; "blending across the seam")]
    #[test_case(1.0, 105, 106, 0.0; "first loop frame after the seam")]
    #[test_case(1.45, 109, 105, 0.5; "loop interior wraps frame_b")]
    fn loop_clip_samples(t: f32, frame_a: u32, frame_b: u32, blend: f32) {
        let pair = loop_clip().sample(t);
        assert_eq!(pair.frame_a, frame_a);
        assert_eq!(pair.frame_b, frame_b);
        assert!((pair.blend - blend).abs() < 1e-4, "blend {}", pair.blend);
    }

    #[test]
    fn loop_clip_is_periodic_after_first_pass() {
        let clip = loop_clip();
        let period = clip.loop_frames as f32 / clip.fps as f32;

        for t in [1.02, 1.3, 1.77, 2.5] {
            let a = clip.sample(t);
            let b = clip.sample(t + period);
            assert_eq!(a.frame_a, b.frame_a, "frame_a at t={t}");
            assert!((a.blend - b.blend).abs() < 1e-3, "blend at t={t}");
        }
    }

    #[test]
    fn whole_clip_loop_cycles_from_start() {
        let clip = Clip {
            name: "LEGS_WALK".to_string(),
            first_frame: 20,
            num_frames: 4,
            loop_frames: 4,
            fps: 4,
        };

        // Initial pass runs 20..23, then cycles over the full range
        assert_eq!(clip.sample(0.0).frame_a, 20);
        assert_eq!(clip.sample(0.75).frame_a, 23);
        assert_eq!(clip.sample(0.75).frame_b, 20);
        assert_eq!(clip.sample(1.0).frame_a, 20);
        assert_eq!(clip.sample(1.75).frame_a, 23);
        assert_eq!(clip.sample(2.0).frame_a, 20);
    }

    const SARGE_CFG: &str = "\
// animation config file
sex m
headoffset 0 0 0
footsteps normal

0\t30\t0\t25\t\t// BOTH_DEATH1
29\t1\t0\t25\t\t// BOTH_DEAD1
30\t30\t0\t25\t\t// BOTH_DEATH2
59\t1\t0\t25\t\t// BOTH_DEAD2
60\t30\t0\t25\t\t// BOTH_DEATH3
89\t1\t0\t25\t\t// BOTH_DEAD3

90\t40\t0\t20\t\t// TORSO_GESTURE
130\t6\t0\t15\t\t// TORSO_ATTACK
136\t6\t0\t15\t\t// TORSO_ATTACK2
142\t5\t0\t20\t\t// TORSO_DROP
147\t4\t0\t20\t\t// TORSO_RAISE
151\t1\t0\t15\t\t// TORSO_STAND
152\t1\t0\t15\t\t// TORSO_STAND2

153\t8\t4\t20\t\t// LEGS_WALKCR
161\t12\t0\t20\t\t// LEGS_WALK
173\t9\t9\t18\t\t// LEGS_RUN
182\t10\t10\t20\t\t// LEGS_BACK
192\t10\t10\t15\t\t// LEGS_SWIM
202\t8\t0\t15\t\t// LEGS_JUMP
210\t3\t0\t15\t\t// LEGS_LAND
213\t8\t0\t15\t\t// LEGS_JUMPB
221\t3\t0\t15\t\t// LEGS_LANDB
224\t10\t10\t15\t\t// LEGS_IDLE
234\t10\t10\t15\t\t// LEGS_IDLECR
244\t7\t7\t15\t\t// LEGS_TURN
";

    #[test]
    fn parse_full_directory() {
        let set = ClipSet::parse(SARGE_CFG);

        assert_eq!(set.names(Region::Torso).len(), 13);
        assert_eq!(set.names(Region::Legs).len(), 18);

        let gesture = set.get(Region::Torso, "TORSO_GESTURE").unwrap();
        assert_eq!(gesture.first_frame, 90);
        assert_eq!(gesture.fps, 20);

        // BOTH_ clips keep their raw first frame in both spaces
        let death = set.get(Region::Legs, "BOTH_DEATH2").unwrap();
        assert_eq!(death.first_frame, 30);
    }

    #[test]
    fn legs_clips_are_rebased_by_torso_total() {
        let set = ClipSet::parse(SARGE_CFG);

        // TORSO_ frame counts sum to 40+6+6+5+4+1+1 = 63
        let walkcr = set.get(Region::Legs, "LEGS_WALKCR").unwrap();
        assert_eq!(walkcr.first_frame, 153 - 63);

        let idle = set.get(Region::Legs, "LEGS_IDLE").unwrap();
        assert_eq!(idle.first_frame, 224 - 63);

        // Torso space is untouched
        assert!(set.get(Region::Torso, "LEGS_WALKCR").is_none());
    }

    #[test]
    fn rebase_clamps_at_zero() {
        // A directory whose TORSO_ total exceeds a LEGS_ first frame; reuse
        // torso-total 120 against a raw legs start of 150
        let mut text = String::new();
        for _ in 0..6 {
            text.push_str("0 1 0 10\n");
        }
        text.push_str("0 120 0 10\n"); // TORSO_GESTURE: the whole torso total
        for _ in 0..6 {
            text.push_str("120 0 0 10\n");
        }
        text.push_str("150 10 0 10\n"); // LEGS_WALKCR
        text.push_str("100 10 0 10\n"); // LEGS_WALK rebases below zero

        let set = ClipSet::parse(&text);
        assert_eq!(set.get(Region::Legs, "LEGS_WALKCR").unwrap().first_frame, 30);
        assert_eq!(set.get(Region::Legs, "LEGS_WALK").unwrap().first_frame, 0);
    }

    #[test]
    fn short_file_leaves_trailing_names_unmapped() {
        let set = ClipSet::parse("0 30 0 25\n29 1 0 25\n");

        assert!(set.get(Region::Torso, "BOTH_DEATH1").is_some());
        assert!(set.get(Region::Torso, "TORSO_GESTURE").is_none());
        assert!(set.get(Region::Legs, "LEGS_RUN").is_none());

        // Defaults alias to the first usable clip
        assert_eq!(
            set.default_clip(Region::Torso).unwrap().first_frame,
            0
        );
        assert_eq!(set.default_clip(Region::Legs).unwrap().first_frame, 0);
    }

    #[test]
    fn empty_or_garbage_falls_back() {
        for text in ["", "// nothing here\n", "sex f\nfootsteps boot\n", "1 2 x\n"] {
            let set = ClipSet::parse(text);
            let stand = set.get(Region::Torso, "TORSO_STAND").unwrap();
            assert_eq!(stand.num_frames, 1);
            let idle = set.get(Region::Legs, "LEGS_IDLE").unwrap();
            assert_eq!(idle.num_frames, 1);
        }
    }

    #[test]
    fn extra_lines_are_ignored() {
        let mut text = String::new();
        for i in 0..30 {
            text.push_str(&format!("{i} 1 0 10\n"));
        }

        let set = ClipSet::parse(&text);
        assert_eq!(set.names(Region::Torso).len(), 13);
        assert_eq!(set.names(Region::Legs).len(), 18);
    }
}
