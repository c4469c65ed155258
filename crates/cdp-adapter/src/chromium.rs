use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::SurfaceConfig;
use crate::error::SurfaceError;
use crate::surface::{AutomationSurface, BoundingBox};

const CLEAR_VALUE_JS: &str = "function() { \
    if ('value' in this) { this.value = ''; } \
    this.dispatchEvent(new Event('input', { bubbles: true })); \
}";

/// Single-page Chromium session driven over CDP.
pub struct ChromiumSurface {
    browser: Option<Browser>,
    page: Page,
    handler: Option<JoinHandle<()>>,
    navigation_timeout: Duration,
}

impl ChromiumSurface {
    /// Launches the browser, spawns the CDP handler loop and opens one blank page.
    pub async fn launch(config: &SurfaceConfig) -> Result<Self, SurfaceError> {
        let mut builder =
            BrowserConfig::builder().window_size(config.window_width, config.window_height);
        if !config.headless {
            builder = builder.with_head();
        }
        if let Some(executable) = config.resolved_executable() {
            debug!(target: "cdp", executable = %executable.display(), "Using browser binary");
            builder = builder.chrome_executable(executable);
        }
        if let Some(dir) = &config.user_data_dir {
            builder = builder.user_data_dir(dir);
        }
        let browser_config = builder.build().map_err(SurfaceError::Launch)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|err| SurfaceError::Launch(err.to_string()))?;
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(err) = event {
                    debug!(target: "cdp", error = %err, "CDP handler reported an error");
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(err) => {
                handler_task.abort();
                return Err(SurfaceError::Launch(err.to_string()));
            }
        };

        info!(target: "cdp", headless = config.headless, "Chromium session started");
        Ok(Self {
            browser: Some(browser),
            page,
            handler: Some(handler_task),
            navigation_timeout: config.navigation_timeout(),
        })
    }

    fn ensure_open(&self) -> Result<(), SurfaceError> {
        if self.browser.is_some() {
            Ok(())
        } else {
            Err(SurfaceError::Closed)
        }
    }

    async fn first_match(&self, selector: &str) -> Result<Option<Element>, SurfaceError> {
        self.ensure_open()?;
        let elements = self.page.find_elements(selector).await?;
        Ok(elements.into_iter().next())
    }

    async fn element(&self, selector: &str) -> Result<Element, SurfaceError> {
        self.first_match(selector)
            .await?
            .ok_or_else(|| SurfaceError::NotFound(selector.to_string()))
    }
}

#[async_trait]
impl AutomationSurface for ChromiumSurface {
    async fn navigate(&mut self, url: &str) -> Result<(), SurfaceError> {
        self.ensure_open()?;
        let timeout = self.navigation_timeout;
        tokio::time::timeout(timeout, self.page.goto(url))
            .await
            .map_err(|_| SurfaceError::Timeout {
                operation: "navigate",
                timeout_ms: timeout.as_millis(),
            })??;
        Ok(())
    }

    async fn click(&mut self, selector: &str) -> Result<(), SurfaceError> {
        let element = self.element(selector).await?;
        element.click().await?;
        Ok(())
    }

    async fn fill(&mut self, selector: &str, value: &str) -> Result<(), SurfaceError> {
        let element = self.element(selector).await?;
        element.click().await?;
        element.call_js_fn(CLEAR_VALUE_JS, false).await?;
        element.type_str(value).await?;
        Ok(())
    }

    async fn snapshot(&mut self) -> Result<Vec<u8>, SurfaceError> {
        self.ensure_open()?;
        Ok(self
            .page
            .screenshot(ScreenshotParams::builder().build())
            .await?)
    }

    async fn content(&mut self) -> Result<String, SurfaceError> {
        self.ensure_open()?;
        Ok(self.page.content().await?)
    }

    async fn locate(&mut self, selector: &str) -> Result<Option<BoundingBox>, SurfaceError> {
        let Some(element) = self.first_match(selector).await? else {
            return Ok(None);
        };
        let rect = element.bounding_box().await?;
        Ok(Some(BoundingBox::new(rect.x, rect.y, rect.width, rect.height)))
    }

    async fn close(&mut self) -> Result<(), SurfaceError> {
        let Some(mut browser) = self.browser.take() else {
            debug!(target: "cdp", "Chromium session already closed");
            return Ok(());
        };

        let closed = browser.close().await;
        if let Err(err) = &closed {
            warn!(target: "cdp", error = %err, "Browser close command failed");
        }
        if let Err(err) = browser.wait().await {
            warn!(target: "cdp", error = %err, "Waiting for browser exit failed");
        }
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
        info!(target: "cdp", "Chromium session closed");
        closed.map(|_| ()).map_err(SurfaceError::from)
    }
}

impl Drop for ChromiumSurface {
    fn drop(&mut self) {
        // Browser's own Drop kills the child process; the handler task is ours.
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
    }
}
