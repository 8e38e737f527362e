use crate::{
    foundation::error::{FrameIrError, FrameIrResult},
    ir::model::Frame,
    optimize::{optimize_frame_with_stats, opts::OptimizeOpts},
};

/// Structural check run around the optimizer.
///
/// Validation lives outside this crate; implement this trait (or pass a closure) to plug a
/// validator into a [`FramePipeline`].
pub trait FrameValidator {
    /// Return an error if `frame` is not well-formed.
    fn validate(&self, frame: &Frame) -> FrameIrResult<()>;
}

impl<F> FrameValidator for F
where
    F: Fn(&Frame) -> FrameIrResult<()>,
{
    fn validate(&self, frame: &Frame) -> FrameIrResult<()> {
        self(frame)
    }
}

/// `validate -> optimize -> validate` composition.
///
/// The optimizer trusts its input, so a failure on the input side points at the producer and a
/// failure on the output side points at the optimizer. Both surface as
/// [`FrameIrError::Validation`].
pub struct FramePipeline {
    opts: OptimizeOpts,
    validator: Option<Box<dyn FrameValidator + Send + Sync>>,
    validate_output: bool,
}

impl FramePipeline {
    /// Pipeline without a validator.
    pub fn new(opts: OptimizeOpts) -> Self {
        Self {
            opts,
            validator: None,
            validate_output: true,
        }
    }

    /// Run `validator` before (and, unless disabled, after) optimization.
    pub fn with_validator(
        mut self,
        validator: impl FrameValidator + Send + Sync + 'static,
    ) -> Self {
        self.validator = Some(Box::new(validator));
        self
    }

    /// Toggle validation of the optimized frame (on by default).
    pub fn validate_output(mut self, enabled: bool) -> Self {
        self.validate_output = enabled;
        self
    }

    /// Optimizer options used by [`FramePipeline::run`].
    pub fn opts(&self) -> &OptimizeOpts {
        &self.opts
    }

    /// Validate, optimize, and re-validate one frame.
    #[tracing::instrument(skip(self, frame))]
    pub fn run(&self, frame: &Frame) -> FrameIrResult<Frame> {
        self.check("input frame", frame)?;
        let (out, stats) = optimize_frame_with_stats(frame, &self.opts);
        if self.validate_output {
            self.check("optimized frame", &out)?;
        }
        tracing::debug!(rewrites = stats.rewrites(), "pipeline stage complete");
        Ok(out)
    }

    /// [`FramePipeline::run`] over JSON text.
    pub fn run_json(&self, json: &str) -> FrameIrResult<String> {
        let frame = Frame::from_json_str(json)?;
        self.run(&frame)?.to_json_string()
    }

    fn check(&self, stage: &str, frame: &Frame) -> FrameIrResult<()> {
        let Some(v) = &self.validator else {
            return Ok(());
        };
        v.validate(frame).map_err(|e| match e {
            FrameIrError::Validation(msg) => FrameIrError::validation(format!("{stage}: {msg}")),
            other => FrameIrError::validation(format!("{stage}: {other}")),
        })
    }
}

impl Default for FramePipeline {
    fn default() -> Self {
        Self::new(OptimizeOpts::default())
    }
}

/// Parse a frame from JSON, optimize it with `opts`, and serialize the result.
pub fn optimize_frame_json(json: &str, opts: &OptimizeOpts) -> FrameIrResult<String> {
    FramePipeline::new(*opts).run_json(json)
}

#[cfg(test)]
#[path = "../tests/unit/pipeline.rs"]
mod tests;
