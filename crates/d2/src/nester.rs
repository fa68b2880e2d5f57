//! Nesting run loop.
//!
//! [`Nester`] owns the prepared geometry, the NFP cache and the genetic
//! algorithm. Every [`Nester::tick`] evaluates exactly one individual: it
//! resolves the NFPs the individual needs, places it and records the result
//! when it beats the best one so far. [`Nester::start`] moves the nester to a
//! background thread that keeps ticking until stopped.

use crate::clipper::Clipper;
use crate::nfp::{NfpJob, NfpKey};
use crate::nfp_cache::{NfpCache, NfpWorkers};
use crate::placement::{required_keys, Placer};
use crate::polygon;
use crate::tree::{PartInput, PolygonTree, SourceRef};
use polynest_core::{
    Bounds, Config, Error, GeneticAlgorithm, Individual, PlacementResult, Point, PolygonId, Result, Transform2D,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

/// A descendant loop of a placed part, in sheet coordinates.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RenderedLoop {
    /// Transformed vertices.
    pub points: Vec<Point>,
    /// Caller handle of the loop.
    pub source: Option<SourceRef>,
    /// Holes alternate with islands per nesting level.
    pub is_hole: bool,
}

/// A placed part, in sheet coordinates.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RenderedPart {
    /// Part id in the containment tree.
    pub id: PolygonId,
    /// Caller handle of the outer loop.
    pub source: Option<SourceRef>,
    /// Rotation about the part origin, then translation.
    pub transform: Transform2D,
    /// Transformed outer loop.
    pub points: Vec<Point>,
    /// Transformed holes and islands, depth-first.
    pub children: Vec<RenderedLoop>,
}

/// One container instance with the parts placed on it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RenderedSheet {
    /// Container outline, in the frame where the usable area starts at the origin.
    pub container: Vec<Point>,
    /// Caller handle of the container.
    pub container_source: Option<SourceRef>,
    /// Width of the usable container.
    pub width: f64,
    /// Height of the usable container.
    pub height: f64,
    /// Placed parts in placement order.
    pub parts: Vec<RenderedPart>,
}

/// Outcome of one tick.
#[derive(Debug, Clone, PartialEq)]
pub enum NestUpdate {
    /// The evaluated individual beat the best result.
    Improved {
        /// The new best result.
        result: PlacementResult,
        /// The new best result, rendered per sheet.
        sheets: Vec<RenderedSheet>,
        /// Placed part area over the area of all used sheets.
        packed_area_ratio: f64,
        /// Number of parts on some sheet.
        placed_parts: usize,
        /// Number of top-level parts.
        total_parts: usize,
    },
    /// The evaluated individual was not better.
    NoImprovement,
}

impl NestUpdate {
    /// Returns true for [`NestUpdate::Improved`].
    pub fn is_improved(&self) -> bool {
        matches!(self, Self::Improved { .. })
    }
}

/// Geometry derived from the inputs at the start of a run.
#[derive(Debug)]
struct Prepared {
    /// Cleaned input loops; used for rendering.
    source: PolygonTree,
    /// Offset, orientation-normalized loops; used for NFPs and placement.
    parts: PolygonTree,
    /// Offset container aligned to the origin.
    container: Vec<Point>,
    /// Cleaned container outline in the frame of `container`.
    outline: Vec<Point>,
    container_source: Option<SourceRef>,
    bounds: Bounds,
    container_area: f64,
    clipper: Clipper,
    workers: NfpWorkers,
}

impl Prepared {
    fn build(config: &Config, parts: &[PartInput], container: Option<&PartInput>) -> Result<Self> {
        config.validate()?;
        let container = container.ok_or_else(|| Error::InvalidBoundary("no container set".into()))?;
        if parts.is_empty() {
            return Err(Error::NoParts);
        }

        let clipper = Clipper::new(config);
        let min_area = config.curve_tolerance * config.curve_tolerance;
        let half_spacing = 0.5 * config.spacing;

        let mut cleaned = Vec::with_capacity(parts.len());
        for (i, input) in parts.iter().enumerate() {
            match clipper.simplify_and_clean(&input.points) {
                Some(points) if polygon::area(&points).abs() > min_area => cleaned.push(PartInput {
                    points,
                    source: input.source,
                }),
                _ => log::warn!("dropping degenerate part loop {i}"),
            }
        }
        if cleaned.is_empty() {
            return Err(Error::NoParts);
        }

        let source = PolygonTree::build(cleaned);
        let mut offset_parts = source.offset(&clipper, half_spacing);
        offset_parts.normalize_orientation();

        let outline = clipper
            .simplify_and_clean(&container.points)
            .ok_or_else(|| Error::InvalidBoundary("container has fewer than 3 points after cleaning".into()))?;

        let mut working = outline.clone();
        if half_spacing > 0.0 {
            let mut shrunk = clipper.offset(&working, -half_spacing);
            if shrunk.len() == 1 {
                if let Some(points) = shrunk.pop() {
                    working = points;
                }
            }
        }

        let bounds = polygon::bounds(&working)
            .ok_or_else(|| Error::InvalidBoundary("container has no extent".into()))?;
        let working = polygon::normalize_orientation(&polygon::translate(&working, -bounds.x, -bounds.y));
        let outline = polygon::translate(&outline, -bounds.x, -bounds.y);

        let workers = NfpWorkers::new(config)?;
        log::debug!(
            "prepared {} loops ({} parts), container {:.3} x {:.3}, {} NFP workers",
            offset_parts.len(),
            offset_parts.roots().len(),
            bounds.width,
            bounds.height,
            workers.threads()
        );

        Ok(Self {
            source,
            parts: offset_parts,
            container_area: polygon::area(&working).abs(),
            container: working,
            outline,
            container_source: container.source,
            bounds: Bounds::new(0.0, 0.0, bounds.width, bounds.height),
            clipper,
            workers,
        })
    }

    fn loop_points(&self, id: PolygonId) -> Result<&[Point]> {
        self.parts
            .get(id)
            .map(|node| node.points.as_slice())
            .ok_or_else(|| Error::InvalidGeometry(format!("unknown part id {id}")))
    }

    /// Rotated geometry for one NFP key.
    fn job(&self, key: NfpKey) -> Result<NfpJob> {
        let b = polygon::rotate(self.loop_points(key.b)?, key.rotation_b);
        if key.inside {
            return Ok(NfpJob {
                key,
                a: self.container.clone(),
                a_holes: Vec::new(),
                b,
            });
        }

        let a = polygon::rotate(self.loop_points(key.a)?, key.rotation_a);
        let a_holes = self
            .parts
            .children(key.a)
            .iter()
            .map(|&hole| self.loop_points(hole).map(|points| polygon::rotate(points, key.rotation_a)))
            .collect::<Result<Vec<_>>>()?;

        Ok(NfpJob { key, a, a_holes, b })
    }

    /// Seed individual: parts by descending area with fitting rotations.
    fn adam(&self, angles: &[f64], rng: &mut StdRng) -> Individual<PolygonId> {
        let mut roots: Vec<(PolygonId, f64)> = self
            .parts
            .roots()
            .iter()
            .filter_map(|&id| self.parts.get(id).map(|node| (id, node.area().abs())))
            .collect();
        roots.sort_by(|a, b| b.1.total_cmp(&a.1));

        let rotations = roots
            .iter()
            .map(|&(id, _)| {
                let points = self.parts.get(id).map(|node| node.points.as_slice()).unwrap_or(&[]);
                self.seed_rotation(points, angles, rng)
            })
            .collect();

        Individual::new(roots.into_iter().map(|(id, _)| id).collect(), rotations)
    }

    /// First angle of a shuffled list under which the part fits the container.
    fn seed_rotation(&self, points: &[Point], angles: &[f64], rng: &mut StdRng) -> f64 {
        let mut shuffled = angles.to_vec();
        shuffled.shuffle(rng);
        shuffled
            .into_iter()
            .find(|&angle| {
                polygon::bounds(&polygon::rotate(points, angle)).map_or(false, |b| b.fits_within(&self.bounds))
            })
            .unwrap_or(0.0)
    }

    fn render(&self, result: &PlacementResult) -> Vec<RenderedSheet> {
        result
            .sheets
            .iter()
            .map(|sheet| RenderedSheet {
                container: self.outline.clone(),
                container_source: self.container_source,
                width: self.bounds.width,
                height: self.bounds.height,
                parts: sheet
                    .iter()
                    .filter_map(|placement| {
                        let node = self.source.get(placement.id)?;
                        let transform = placement.transform();
                        let children = self
                            .source
                            .flatten(placement.id)
                            .into_iter()
                            .map(|(child, is_hole)| RenderedLoop {
                                points: transform.apply_all(&child.points),
                                source: child.source,
                                is_hole,
                            })
                            .collect();
                        Some(RenderedPart {
                            id: placement.id,
                            source: node.source,
                            transform,
                            points: transform.apply_all(&node.points),
                            children,
                        })
                    })
                    .collect(),
            })
            .collect()
    }

    fn packed_area_ratio(&self, result: &PlacementResult) -> f64 {
        let sheet_area = result.sheets.len() as f64 * self.container_area;
        if sheet_area <= 0.0 {
            return 0.0;
        }
        let placed: f64 = result
            .placements()
            .filter_map(|(_, p)| self.source.get(p.id))
            .map(|node| node.area().abs())
            .sum();
        placed / sheet_area
    }
}

/// Irregular 2D nesting engine.
///
/// # Example
///
/// ```
/// use polynest_core::Config;
/// use polynest_d2::{Nester, PartInput};
///
/// let mut nester = Nester::new(Config::default().with_rotations(1).with_seed(7));
/// nester.set_container(PartInput::rectangle(0.0, 0.0, 100.0, 50.0));
/// nester.set_parts(vec![PartInput::rectangle(0.0, 0.0, 20.0, 10.0)]);
///
/// nester.tick().unwrap();
/// assert_eq!(nester.best().unwrap().placed_count(), 1);
/// ```
#[derive(Debug)]
pub struct Nester {
    config: Config,
    parts: Vec<PartInput>,
    container: Option<PartInput>,
    interval: Duration,
    prepared: Option<Prepared>,
    cache: NfpCache,
    ga: Option<GeneticAlgorithm<PolygonId>>,
    best: Option<PlacementResult>,
}

impl Nester {
    /// Creates a nester with the given configuration and no inputs.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            parts: Vec::new(),
            container: None,
            interval: DEFAULT_INTERVAL,
            prepared: None,
            cache: NfpCache::new(),
            ga: None,
            best: None,
        }
    }

    /// Sets the pause between ticks of a background run.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Replaces the part loops and resets the run.
    pub fn set_parts(&mut self, parts: Vec<PartInput>) {
        self.parts = parts;
        self.invalidate();
    }

    /// Replaces the container and resets the run.
    pub fn set_container(&mut self, container: PartInput) {
        self.container = Some(container);
        self.invalidate();
    }

    /// Merges `update` into the configuration and resets the run.
    ///
    /// The NFP cache, the best result, the genetic algorithm and the prepared
    /// geometry are all dropped, so no entry computed under the old settings
    /// survives.
    pub fn configure(&mut self, update: Config) -> Result<()> {
        let merged = self.config.merge(&update);
        merged.validate()?;
        self.config = merged;
        self.invalidate();
        Ok(())
    }

    fn invalidate(&mut self) {
        self.prepared = None;
        self.ga = None;
        self.best = None;
        self.cache.clear();
    }

    /// Best result found so far.
    pub fn best(&self) -> Option<&PlacementResult> {
        self.best.as_ref()
    }

    /// Resolved NFPs of the current configuration.
    pub fn cache(&self) -> &NfpCache {
        &self.cache
    }

    /// Generations completed by the genetic algorithm.
    pub fn generation(&self) -> u32 {
        self.ga.as_ref().map_or(0, |ga| ga.generation())
    }

    /// Evaluated share of the current population.
    pub fn progress(&self) -> f64 {
        self.ga.as_ref().map_or(0.0, |ga| ga.progress())
    }

    /// Renders `result` per sheet; empty before the first tick.
    pub fn render(&self, result: &PlacementResult) -> Vec<RenderedSheet> {
        self.prepared.as_ref().map_or_else(Vec::new, |prepared| prepared.render(result))
    }

    fn prepare(&mut self) -> Result<()> {
        if self.prepared.is_none() {
            self.prepared = Some(Prepared::build(&self.config, &self.parts, self.container.as_ref())?);
        }
        Ok(())
    }

    /// Evaluates one individual.
    ///
    /// Prepares the geometry and builds the genetic algorithm on first use;
    /// advances a generation when every individual has been evaluated.
    pub fn tick(&mut self) -> Result<NestUpdate> {
        self.prepare()?;
        let prepared = self
            .prepared
            .as_ref()
            .ok_or_else(|| Error::Internal("geometry not prepared".into()))?;

        if self.ga.is_none() {
            let mut rng = match self.config.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let adam = prepared.adam(&self.config.rotation_angles(), &mut rng);
            self.ga = Some(GeneticAlgorithm::with_rng(adam, &self.config, rng));
        }
        let ga = self
            .ga
            .as_mut()
            .ok_or_else(|| Error::Internal("genetic algorithm missing".into()))?;

        let index = match ga.first_unevaluated() {
            Some(index) => index,
            None => {
                ga.next_generation();
                ga.first_unevaluated()
                    .ok_or_else(|| Error::Internal("generation left nothing to evaluate".into()))?
            }
        };
        let order: Vec<(PolygonId, f64)> = ga
            .individual(index)
            .ok_or_else(|| Error::Internal(format!("no individual at {index}")))?
            .iter()
            .map(|(&id, rotation)| (id, rotation))
            .collect();

        let jobs = required_keys(&order)
            .into_iter()
            .filter(|key| !self.cache.contains(key))
            .map(|key| prepared.job(key))
            .collect::<Result<Vec<_>>>()?;
        let pending = jobs.len();
        let report = prepared.workers.resolve_batch(&self.cache, jobs);
        log::debug!(
            "generation {} individual {}: {} NFPs requested, {} computed, {} failed",
            ga.generation(),
            index,
            pending,
            report.computed,
            report.failed
        );

        let placer = Placer {
            cache: &self.cache,
            parts: &prepared.parts,
            container_area: prepared.container_area,
            clipper: &prepared.clipper,
        };
        let result = placer.place(&order);
        ga.set_fitness(index, result.fitness);

        let improved = self
            .best
            .as_ref()
            .map_or(true, |best| result.fitness.is_better_than(&best.fitness));
        if !improved {
            return Ok(NestUpdate::NoImprovement);
        }

        let packed_area_ratio = prepared.packed_area_ratio(&result);
        let placed_parts = result.placed_count();
        log::info!(
            "new best: {} sheet(s), {}/{} parts placed, packed ratio {:.4}",
            result.sheets.len(),
            placed_parts,
            order.len(),
            packed_area_ratio
        );

        let update = NestUpdate::Improved {
            sheets: prepared.render(&result),
            result: result.clone(),
            packed_area_ratio,
            placed_parts,
            total_parts: order.len(),
        };
        self.best = Some(result);
        Ok(update)
    }

    /// Moves the nester to a background thread that ticks until stopped.
    ///
    /// Geometry is prepared before the thread starts, so configuration
    /// errors are returned here and nothing runs. After every tick `progress`
    /// receives the evaluated share of the population and `on_result` the
    /// tick's outcome.
    pub fn start<P, R>(mut self, mut progress: P, mut on_result: R) -> Result<RunHandle>
    where
        P: FnMut(f64) + Send + 'static,
        R: FnMut(&NestUpdate) + Send + 'static,
    {
        self.prepare()?;

        let stop = Arc::new(AtomicBool::new(false));
        let stopped = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("polynest-runner".into())
            .spawn(move || {
                while !stopped.load(Ordering::Relaxed) {
                    match self.tick() {
                        Ok(update) => {
                            progress(self.progress());
                            on_result(&update);
                        }
                        Err(e) => {
                            log::warn!("nesting run stopped: {e}");
                            break;
                        }
                    }
                    if !stopped.load(Ordering::Relaxed) {
                        thread::park_timeout(self.interval);
                    }
                }
                self
            })
            .map_err(|e| Error::Internal(format!("failed to spawn nesting thread: {e}")))?;

        Ok(RunHandle { stop, handle })
    }
}

/// Handle to a background run started with [`Nester::start`].
#[derive(Debug)]
pub struct RunHandle {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<Nester>,
}

impl RunHandle {
    /// Requests a stop; the in-flight tick completes first.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
        self.handle.thread().unpark();
    }

    /// Returns true once the run thread has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stops the run and returns the nester with its state intact.
    pub fn join(self) -> Result<Nester> {
        self.stop();
        self.handle
            .join()
            .map_err(|_| Error::Internal("nesting thread panicked".into()))
    }
}
