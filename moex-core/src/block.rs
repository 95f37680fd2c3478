use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, warn};

use crate::task::Task;
use crate::trial::Trial;

/// Geometry of the trial designs, in notch space.
#[derive(Debug, Clone)]
pub struct BlockConfig {
    /// Size of the logical zoom ruler.
    pub max_notches: i32,
    /// Notches grouped into one visual element (grid cell).
    pub notches_in_element: i32,
    /// Tolerance around the target, in notches.
    pub target_tolerance: i32,
    /// Start-to-target distances, one trial per distance per repetition.
    pub target_distances: Vec<i32>,
    /// Concentric pan curve levels.
    pub pan_levels: u8,
    /// Rotation separation between pan levels, in degrees.
    pub pan_separation: u16,
}

impl Default for BlockConfig {
    fn default() -> Self {
        Self {
            max_notches: 90,
            notches_in_element: 6,
            target_tolerance: 4,
            target_distances: vec![15, 30, 60],
            pan_levels: 3,
            pan_separation: 120,
        }
    }
}

/// One randomized batch of trials for a single task.
#[derive(Debug, Clone)]
pub struct Block {
    pub block_num: i32,
    trials: Vec<Trial>,
}

impl Block {
    pub fn new<R: Rng + ?Sized>(
        block_num: i32,
        task: Task,
        repetitions: usize,
        config: &BlockConfig,
        rng: &mut R,
    ) -> Self {
        let mut block = Self {
            block_num,
            trials: Vec::new(),
        };

        match task {
            Task::ZoomIn => {
                for _ in 0..repetitions {
                    for &dist in &config.target_distances {
                        let snapped = rand_multiple(
                            dist + config.target_tolerance,
                            config.max_notches - config.target_tolerance,
                            config.notches_in_element,
                            rng,
                        );
                        // Center of the element the snapped notch starts.
                        let target = snapped + config.notches_in_element / 2;
                        debug!(dist, snapped, target, start = target - dist, "zoom-in trial");
                        block.trials.push(Trial::zoom(task, target - dist, target));
                    }
                    // Each repetition sub-group is shuffled into what came before.
                    block.trials.shuffle(rng);
                }
            }

            Task::ZoomOut => {
                for &dist in &config.target_distances {
                    for _ in 0..repetitions {
                        let snapped = rand_multiple(
                            config.target_tolerance,
                            config.max_notches - config.target_tolerance - dist,
                            config.notches_in_element,
                            rng,
                        );
                        let target = snapped + config.notches_in_element / 2;
                        debug!(dist, snapped, target, start = target + dist, "zoom-out trial");
                        block.trials.push(Trial::zoom(task, target + dist, target));
                    }
                }
                block.trials.shuffle(rng);
            }

            Task::Pan => {
                // One random base rotation per repetition; the other levels
                // sit at equal separations around the circle.
                for _ in 0..repetitions {
                    let base = rng.random_range(0..360) as u16;
                    for level in 1..=config.pan_levels {
                        let rotation = (base + u16::from(level - 1) * config.pan_separation) % 360;
                        block.trials.push(Trial::pan(level, rotation));
                    }
                }
                block.trials.shuffle(rng);
            }
        }

        block.renumber();
        block
    }

    /// Assign dense trial numbers and ids in the current order.
    fn renumber(&mut self) {
        for (i, trial) in self.trials.iter_mut().enumerate() {
            trial.block_num = self.block_num;
            trial.trial_num = i as i32 + 1;
            trial.id = trial.block_num * 100 + trial.trial_num;
        }
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    /// Deep copy of trial `num` (1-based); `None` past the end.
    pub fn trial(&self, num: i32) -> Option<Trial> {
        if num < 1 {
            return None;
        }
        self.trials.get(num as usize - 1).cloned()
    }

    /// True once `num` is the last trial in the block.
    pub fn is_finished(&self, num: i32) -> bool {
        num >= self.trials.len() as i32
    }

    /// Re-queue trial `num` after a failed attempt: a clone (with one
    /// more retry on it) lands at a uniform random index in
    /// `[num, len]` -- never earlier than its old position, possibly at
    /// the very end. Numbering is refreshed afterwards.
    pub fn reinsert_trial<R: Rng + ?Sized>(&mut self, num: i32, rng: &mut R) {
        if num < 1 || num as usize > self.trials.len() {
            warn!(num, len = self.trials.len(), "reinsert of unknown trial ignored");
            return;
        }
        let mut clone = self.trials[num as usize - 1].clone();
        clone.retries += 1;
        let at = rng.random_range(num as usize..=self.trials.len());
        debug!(num, at, "reinserting trial");
        self.trials.insert(at, clone);
        self.renumber();
    }
}

/// Uniform random multiple of `step` in `[min, bound)`. Falls back to
/// the smallest multiple at or above `min` when the range is empty.
fn rand_multiple<R: Rng + ?Sized>(min: i32, bound: i32, step: i32, rng: &mut R) -> i32 {
    let lo = (min + step - 1) / step;
    let hi = (bound - 1).div_euclid(step);
    if hi <= lo {
        return lo * step;
    }
    rng.random_range(lo..=hi) * step
}
