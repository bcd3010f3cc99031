pub(crate) mod attempts;
pub(crate) mod grading;
pub(crate) mod module_completion;
pub(crate) mod scoring;
