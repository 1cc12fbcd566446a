use crate::decode::CanonicalAudio;
use crate::emotion::{ClassifyError, EmotionClassifier, EmotionDistribution};
use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::Mutex;

/// Lets at most one `classify` call into `inner` at a time.
///
/// For model backends that are not reentrant. Callers queue on an async mutex
/// in arrival order.
pub struct SerializedClassifier<C> {
    inner: C,
    gate: Mutex<()>,
}

impl<C> SerializedClassifier<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            gate: Mutex::new(()),
        }
    }
}

impl<C: EmotionClassifier> EmotionClassifier for SerializedClassifier<C> {
    fn classify(
        &self,
        audio: CanonicalAudio,
    ) -> BoxFuture<'_, Result<EmotionDistribution, ClassifyError>> {
        async move {
            let _guard = self.gate.lock().await;
            self.inner.classify(audio).await
        }
        .boxed()
    }
}
