//! Stealth injection for browser pages
//!
//! Must run on a blank page before the first navigation: scripts are
//! registered with `Page.addScriptToEvaluateOnNewDocument`, so they execute
//! ahead of any site script on every document the page loads.

use anyhow::{Context, Result};
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::emulation::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use tracing::debug;

use crate::utils::{ACCEPT_LANGUAGE, CHROME_USER_AGENT};

/// Fingerprint values presented to the site
#[derive(Debug, Clone)]
pub struct StealthProfile {
    pub user_agent: String,
    pub accept_language: String,
    pub platform: String,
    pub languages: Vec<String>,
    pub webgl_vendor: String,
    pub webgl_renderer: String,
    pub hardware_concurrency: u32,
}

impl Default for StealthProfile {
    fn default() -> Self {
        Self {
            user_agent: CHROME_USER_AGENT.to_string(),
            accept_language: ACCEPT_LANGUAGE.to_string(),
            platform: "Win32".to_string(),
            languages: vec!["en-US".to_string(), "en".to_string()],
            webgl_vendor: "Intel Inc.".to_string(),
            webgl_renderer: "Intel(R) UHD Graphics".to_string(),
            hardware_concurrency: 8,
        }
    }
}

const WEBDRIVER_JS: &str = r"
    Object.defineProperty(Object.getPrototypeOf(navigator), 'webdriver', {
        get: () => undefined,
        configurable: true
    });
";

const PLUGINS_JS: &str = r"
    (() => {
        const mockPlugins = [
            { name: 'Chrome PDF Plugin', description: 'Portable Document Format', filename: 'internal-pdf-viewer' },
            { name: 'Chrome PDF Viewer', description: '', filename: 'mhjfbmdgcfjbbpaeojofohoefgiehjai' },
            { name: 'Native Client', description: '', filename: 'internal-nacl-plugin' }
        ];
        const proto = Object.getPrototypeOf(navigator.plugins);
        Object.defineProperty(navigator, 'plugins', {
            get: () => {
                const plugins = {};
                mockPlugins.forEach((p, i) => { plugins[i] = p; plugins[p.name] = p; });
                Object.setPrototypeOf(plugins, proto);
                Object.defineProperty(plugins, 'length', { value: mockPlugins.length });
                return plugins;
            }
        });
    })();
";

const CHROME_RUNTIME_JS: &str = r"
    if (!window.chrome) { window.chrome = {}; }
    if (!window.chrome.runtime) {
        window.chrome.runtime = {
            connect: () => ({
                onMessage: { addListener: () => {}, removeListener: () => {} },
                postMessage: () => {}
            }),
            sendMessage: () => {}
        };
    }
";

/// Build the single evasion script for a profile
#[must_use]
pub fn evasion_script(profile: &StealthProfile) -> String {
    let languages =
        serde_json::to_string(&profile.languages).unwrap_or_else(|_| "[\"en-US\"]".to_string());
    let fingerprint = format!(
        r"
    Object.defineProperty(navigator, 'languages', {{ get: () => {languages} }});
    Object.defineProperty(navigator, 'platform', {{ get: () => '{platform}' }});
    Object.defineProperty(navigator, 'hardwareConcurrency', {{ get: () => {cores} }});
    (() => {{
        const handler = {{
            apply(target, ctx, args) {{
                const param = (args && args[0]) || null;
                if (param === 37445) return '{vendor}';
                if (param === 37446) return '{renderer}';
                return Reflect.apply(target, ctx, args);
            }}
        }};
        for (const ctor of [window.WebGLRenderingContext, window.WebGL2RenderingContext]) {{
            if (ctor) {{
                ctor.prototype.getParameter = new Proxy(ctor.prototype.getParameter, handler);
            }}
        }}
    }})();
",
        platform = profile.platform,
        cores = profile.hardware_concurrency,
        vendor = profile.webgl_vendor,
        renderer = profile.webgl_renderer,
    );

    [WEBDRIVER_JS, PLUGINS_JS, CHROME_RUNTIME_JS, fingerprint.as_str()].join("\n")
}

/// Register evasions and the user-agent override on a blank page
pub async fn inject(page: &Page, profile: &StealthProfile) -> Result<()> {
    debug!("Injecting stealth evasions");

    let user_agent = profile.user_agent.replace("HeadlessChrome", "Chrome");
    let ua_override = SetUserAgentOverrideParams::builder()
        .user_agent(user_agent)
        .accept_language(profile.accept_language.clone())
        .platform(profile.platform.clone())
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build user agent override: {e}"))?;
    page.execute(ua_override)
        .await
        .context("Failed to override user agent")?;

    page.execute(AddScriptToEvaluateOnNewDocumentParams {
        source: evasion_script(profile),
        include_command_line_api: None,
        world_name: None,
        run_immediately: None,
    })
    .await
    .context("Failed to register evasion script")?;

    Ok(())
}
