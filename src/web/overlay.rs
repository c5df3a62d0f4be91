//! DOM overlay renderer for `#main-preloader`

use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement};

use crate::overlay::{progress_label, OverlayRenderer, FADE_OUT_CLASS, OVERLAY_ID};

const TEMPLATE: &str = r#"
<div id="main-preloader" class="preloader" style="display:none">
    <div class="preloader-content">
        <div class="preloader-logo">
            <i class="fas fa-chart-line"></i>
        </div>
        <h2 class="preloader-title">Financeira Autêntica</h2>
        <div class="preloader-spinner">
            <div class="spinner-circle"></div>
            <div class="spinner-circle"></div>
            <div class="spinner-circle"></div>
        </div>
        <div class="preloader-progress">
            <div class="preloader-progress-bar" style="width:0%"></div>
        </div>
        <div class="preloader-percentage">0%</div>
        <div class="preloader-text">
            <span class="loading-text">Carregando dados</span><span class="loading-dots"></span>
        </div>
    </div>
</div>
"#;

struct Parts {
    root: HtmlElement,
    bar: Option<HtmlElement>,
    label: Option<Element>,
    text: Option<Element>,
}

pub struct DomOverlay {
    document: Document,
    parts: Option<Parts>,
}

impl DomOverlay {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            parts: None,
        }
    }

    fn body(&self) -> Option<HtmlElement> {
        self.document.body()
    }

    fn find(root: &HtmlElement, selector: &str) -> Option<Element> {
        root.query_selector(selector).ok().flatten()
    }

    fn root_element(&self) -> Option<HtmlElement> {
        self.document
            .get_element_by_id(OVERLAY_ID)?
            .dyn_into::<HtmlElement>()
            .ok()
    }

    fn set_display(&self, value: &str) {
        if let Some(parts) = &self.parts {
            let _ = parts.root.style().set_property("display", value);
        }
    }
}

impl OverlayRenderer for DomOverlay {
    fn is_mounted(&self) -> bool {
        self.parts.is_some()
    }

    fn mount(&mut self) {
        // Server-rendered pages may already carry the markup
        if self.root_element().is_none() {
            let Some(body) = self.body() else {
                log::warn!("no <body> to mount the preloader into");
                return;
            };
            if let Err(err) = body.insert_adjacent_html("afterbegin", TEMPLATE) {
                log::warn!("failed to insert preloader markup: {err:?}");
                return;
            }
        }
        let Some(root) = self.root_element() else {
            return;
        };
        let bar: Option<HtmlElement> =
            Self::find(&root, ".preloader-progress-bar").and_then(|e| e.dyn_into().ok());
        let label = Self::find(&root, ".preloader-percentage");
        let text = Self::find(&root, ".loading-text");
        self.parts = Some(Parts {
            root,
            bar,
            label,
            text,
        });
    }

    fn reveal(&mut self) {
        if let Some(parts) = &self.parts {
            let _ = parts.root.class_list().remove_1(FADE_OUT_CLASS);
        }
        self.set_display("flex");
    }

    fn begin_fade_out(&mut self) {
        if let Some(parts) = &self.parts {
            let _ = parts.root.class_list().add_1(FADE_OUT_CLASS);
        }
    }

    fn hide_node(&mut self) {
        self.set_display("none");
    }

    fn set_progress(&mut self, percent: f64) {
        let Some(parts) = &self.parts else { return };
        if let Some(bar) = &parts.bar {
            let _ = bar.style().set_property("width", &format!("{percent}%"));
        }
        if let Some(label) = &parts.label {
            label.set_text_content(Some(&progress_label(percent)));
        }
    }

    fn set_message(&mut self, text: &str) {
        if let Some(el) = self.parts.as_ref().and_then(|p| p.text.as_ref()) {
            el.set_text_content(Some(text));
        }
    }

    fn set_scroll_locked(&mut self, locked: bool) {
        let Some(body) = self.body() else { return };
        let style = body.style();
        if locked {
            let _ = style.set_property("overflow", "hidden");
        } else {
            let _ = style.remove_property("overflow");
        }
    }
}
