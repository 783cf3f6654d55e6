//! Page overlay: DOM rules applied to the hosted page after each load.
//!
//! Rules are data. [`render_script`] embeds them as JSON into a single script
//! the host evaluates in the page; the script re-applies them every 500 ms and
//! on DOM mutations, so controls the page re-renders stay hidden and floating
//! buttons survive client side navigation.

use serde::{Deserialize, Serialize};

/// Name of the object the host exposes in the page for button commands.
pub const DEFAULT_BRIDGE_NAME: &str = "webshell";

const STYLE_ID: &str = "webshell-overlay-css";

/// What a floating button does when clicked.
#[derive(uniffi::Enum, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ButtonAction {
    /// Navigate the page back to the target url.
    ReloadTarget,
    /// Run a shell command through the page bridge, e.g. `clear-session-and-reload`.
    Command { name: String },
}

#[derive(uniffi::Record, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct OverlayButton {
    /// DOM id, the button is created once per id.
    pub id: String,
    pub label: String,
    pub title: String,
    pub background: String,
    pub hover_background: String,
    /// Distance from the bottom edge, buttons stack on the right edge.
    pub bottom_px: u32,
    pub action: ButtonAction,
}

#[derive(uniffi::Enum, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageRule {
    /// Remove every element matching `selector`.
    Hide { selector: String },
    /// Remove the closest `button` around elements matching `selector` whose
    /// trimmed text is `text`.
    RemoveMatchingText { selector: String, text: String },
    FloatingButton { button: OverlayButton },
}

const LEAVE_FULLSCREEN: [&str; 5] = [
    r#"button[aria-label="Leave fullscreen"]"#,
    r#"button[iconname="fullscreen_exit"]"#,
    r#"button[mattooltip="Leave fullscreen"]"#,
    r#"[aria-label="Leave fullscreen"]"#,
    r#"[mattooltip="Leave fullscreen"]"#,
];

fn button(
    id: &str,
    label: &str,
    title: &str,
    colors: (&str, &str),
    bottom_px: u32,
    action: ButtonAction,
) -> PageRule {
    PageRule::FloatingButton {
        button: OverlayButton {
            id: id.into(),
            label: label.into(),
            title: title.into(),
            background: colors.0.into(),
            hover_background: colors.1.into(),
            bottom_px,
            action,
        },
    }
}

/// Hides the leave-fullscreen controls and adds the reload, switch account and
/// paste cookies buttons.
pub fn default_rules() -> Vec<PageRule> {
    let mut rules: Vec<PageRule> = LEAVE_FULLSCREEN
        .iter()
        .map(|selector| PageRule::Hide {
            selector: selector.to_string(),
        })
        .collect();

    rules.push(PageRule::RemoveMatchingText {
        selector: ".material-symbols-outlined".into(),
        text: "fullscreen_exit".into(),
    });

    rules.extend([
        button(
            "webshell-reload-btn",
            "↻",
            "Reload App",
            ("#4285f4", "#3367d6"),
            20,
            ButtonAction::ReloadTarget,
        ),
        button(
            "webshell-logout-btn",
            "⏻",
            "Switch Account (Clear Cache & Logout)",
            ("#ea4335", "#c5221f"),
            80,
            ButtonAction::Command {
                name: "clear-session-and-reload".into(),
            },
        ),
        button(
            "webshell-import-btn",
            "📋",
            "Paste Cookies (copy from browser first)",
            ("#34a853", "#2d8e47"),
            140,
            ButtonAction::Command {
                name: "paste-cookies-from-clipboard".into(),
            },
        ),
    ]);

    rules
}

fn hide_css(rules: &[PageRule]) -> String {
    let selectors: Vec<&str> = rules
        .iter()
        .filter_map(|rule| match rule {
            PageRule::Hide { selector } => Some(selector.as_str()),
            _ => None,
        })
        .collect();

    if selectors.is_empty() {
        return String::new();
    }

    format!(
        "{} {{ display: none !important; visibility: hidden !important; }}",
        selectors.join(",\n")
    )
}

/// Substitutes `__KEY__` placeholders in one pass, so substituted values are
/// never scanned again.
fn fill(template: &str, values: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("__") {
        let tail = &rest[start..];
        match values.iter().find(|(key, _)| tail.starts_with(key)) {
            Some((key, value)) => {
                out.push_str(&rest[..start]);
                out.push_str(value);
                rest = &tail[key.len()..];
            }
            None => {
                out.push_str(&rest[..start + 2]);
                rest = &tail[2..];
            }
        }
    }

    out.push_str(rest);
    out
}

pub fn render_script(
    rules: &[PageRule],
    target_url: &str,
    bridge: &str,
) -> serde_json::Result<String> {
    Ok(fill(
        SCRIPT_TEMPLATE,
        &[
            ("__RULES__", serde_json::to_string(rules)?),
            ("__TARGET_URL__", serde_json::to_string(target_url)?),
            ("__BRIDGE__", serde_json::to_string(bridge)?),
            ("__HIDE_CSS__", serde_json::to_string(&hide_css(rules))?),
            ("__STYLE_ID__", serde_json::to_string(STYLE_ID)?),
        ],
    ))
}

const SCRIPT_TEMPLATE: &str = r#"(function () {
  if (window.__webshellOverlay) return;
  window.__webshellOverlay = true;

  const RULES = __RULES__;
  const TARGET_URL = __TARGET_URL__;
  const BRIDGE = __BRIDGE__;
  const HIDE_CSS = __HIDE_CSS__;
  const STYLE_ID = __STYLE_ID__;

  function injectCss() {
    if (!HIDE_CSS || document.getElementById(STYLE_ID)) return;
    const style = document.createElement('style');
    style.id = STYLE_ID;
    style.textContent = HIDE_CSS;
    (document.head || document.documentElement).appendChild(style);
  }

  function hide(rule) {
    document.querySelectorAll(rule.selector).forEach(function (el) {
      el.style.setProperty('display', 'none', 'important');
      el.remove();
    });
  }

  function removeMatchingText(rule) {
    document.querySelectorAll(rule.selector).forEach(function (el) {
      if (el.textContent && el.textContent.trim() === rule.text) {
        const btn = el.closest('button');
        if (btn) btn.remove();
      }
    });
  }

  function runAction(action) {
    if (action.type === 'reload_target') {
      window.location.href = TARGET_URL;
      return;
    }
    const bridge = window[BRIDGE];
    if (bridge && typeof bridge.dispatch === 'function') {
      return bridge.dispatch(action.name, '{}');
    }
  }

  function floatingButton(button) {
    if (!document.body || document.getElementById(button.id)) return;
    const btn = document.createElement('button');
    btn.id = button.id;
    btn.textContent = button.label;
    btn.title = button.title;
    btn.setAttribute('style', [
      'position: fixed',
      'bottom: ' + button.bottom_px + 'px',
      'right: 20px',
      'width: 50px',
      'height: 50px',
      'border-radius: 50%',
      'background: ' + button.background,
      'color: white',
      'border: none',
      'font-size: 20px',
      'cursor: pointer',
      'z-index: 2147483647',
      'box-shadow: 0 2px 10px rgba(0,0,0,0.3)',
      'display: flex',
      'align-items: center',
      'justify-content: center'
    ].map(function (decl) { return decl + ' !important'; }).join('; '));
    btn.onclick = function () { return runAction(button.action); };
    btn.onmouseover = function () {
      btn.style.setProperty('background', button.hover_background, 'important');
    };
    btn.onmouseout = function () {
      btn.style.setProperty('background', button.background, 'important');
    };
    document.body.appendChild(btn);
  }

  function apply() {
    injectCss();
    RULES.forEach(function (rule) {
      switch (rule.kind) {
        case 'hide': hide(rule); break;
        case 'remove_matching_text': removeMatchingText(rule); break;
        case 'floating_button': floatingButton(rule.button); break;
      }
    });
  }

  apply();
  setInterval(apply, 500);

  const observer = new MutationObserver(apply);
  if (document.body) {
    observer.observe(document.body, { childList: true, subtree: true });
  }
})();
"#;
