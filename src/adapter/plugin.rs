use crate::task::{EndpointRequest, PluginInfo, Response, TaskContext, TaskError};

#[async_trait::async_trait]
pub trait ActionPlugin: Send + Sync {
    /// action plugin tag, used to route dispatch calls, must be unique
    fn tag(&self) -> &str;

    /// action plugin type
    fn r#type(&self) -> &'static str;

    /// static descriptor of the plugin and the params its action accepts
    fn info(&self) -> PluginInfo;

    /// run the action for one step
    ///
    /// The step is registered for cancellation before this is called and
    /// unregistered after it returns. Implementations report `running` before
    /// doing any work and finish with exactly one terminal status through the
    /// context. Returning `TaskError::Canceled` is the normal way out after a
    /// checkpoint observed a cancellation.
    async fn execute(&self, ctx: &mut TaskContext) -> Result<Response, TaskError>;

    /// inbound call from the platform, not tied to a step
    async fn endpoint_request(&self, _request: EndpointRequest) -> Result<Response, TaskError> {
        Err(TaskError::NotSupported)
    }
}
