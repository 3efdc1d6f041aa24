use std::time::Instant;

use crate::context::DataContext;
use crate::datasource::{Datasource, RequestConfig};
use crate::error::DatasourceResult;
use crate::template::{MiniJinjaRenderer, TemplateRenderer};

use super::{
    models::{ExecutorOptions, Preparation, RequestOutcome, RequestSummary},
    prepare::prepare_request,
    response::map_response,
    transport::HttpTransport,
};

/// Runs datasource requests: render, authorize, send, map.
pub struct RequestExecutor<R = MiniJinjaRenderer> {
    datasource: Datasource,
    renderer: R,
    transport: HttpTransport,
}

impl RequestExecutor<MiniJinjaRenderer> {
    pub fn new(datasource: Datasource) -> DatasourceResult<Self> {
        Self::with_renderer(datasource, MiniJinjaRenderer::new(), ExecutorOptions::default())
    }

    pub fn with_options(datasource: Datasource, options: ExecutorOptions) -> DatasourceResult<Self> {
        Self::with_renderer(datasource, MiniJinjaRenderer::new(), options)
    }
}

impl<R: TemplateRenderer> RequestExecutor<R> {
    pub fn with_renderer(
        datasource: Datasource,
        renderer: R,
        options: ExecutorOptions,
    ) -> DatasourceResult<Self> {
        Ok(Self {
            datasource,
            renderer,
            transport: HttpTransport::new(&options)?,
        })
    }

    pub fn datasource(&self) -> &Datasource {
        &self.datasource
    }

    /// Renders the configured endpoint without authorizing or sending it.
    pub fn prepare(&self, data: &DataContext, config: &RequestConfig) -> DatasourceResult<Preparation> {
        let endpoint = self.datasource.endpoint(&config.endpoint)?;
        prepare_request(&self.renderer, endpoint, data, config)
    }

    /// Performs the call described by `config` and maps its response.
    ///
    /// `data` is never modified; the context produced by outbound mapping is
    /// returned in [`RequestOutcome::context`].
    pub async fn request(
        &self,
        data: &DataContext,
        config: &RequestConfig,
    ) -> DatasourceResult<RequestOutcome> {
        let Preparation {
            mut request,
            context,
        } = self.prepare(data, config)?;

        self.datasource
            .authorization
            .apply(&mut request, &self.transport)
            .await?;

        tracing::info!(
            endpoint = %config.endpoint,
            method = %request.method,
            url = %request.url,
            auth = self.datasource.authorization.kind().unwrap_or("none"),
            "executing datasource request"
        );

        let start = Instant::now();
        let response = self.transport.send(&request).await?;
        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        let status = response.status;

        let mappings = config.data_mapping.as_deref().unwrap_or_default();
        let result = map_response(response, &context, mappings).inspect_err(|err| {
            tracing::warn!(endpoint = %config.endpoint, status, error = %err, "datasource request failed");
        })?;

        Ok(RequestOutcome {
            request: RequestSummary {
                method: request.method,
                url: request.url,
                body_bytes: request.body.len(),
            },
            status,
            result,
            context,
            duration_ms,
        })
    }
}
