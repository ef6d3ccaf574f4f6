use std::collections::BTreeSet;

use blocker_core::{Identity, NodeHandle};
use blocker_logging::{blocker_debug, blocker_info};
use scraper::Selector;

use crate::detect::extract_record;
use crate::dom::HtmlSurface;
use crate::profile::CompiledProfile;
use crate::surface::{Mutation, Surface, SurfaceError};

const ROLE_ATTR: &str = "data-rehearsal";

/// A saved feed page that answers clicks the way the live feed does.
///
/// Clicking inside a post opens its actions menu, the menu's block item opens the
/// confirmation sheet, and confirming removes the sheet together with every post of
/// the blocked author. Menus and sheets use the live feed's markup.
#[derive(Debug)]
pub struct RehearsalSurface {
    dom: HtmlSurface,
    profile: CompiledProfile,
    menu: Option<Overlay>,
    sheet: Option<Overlay>,
    blocked: BTreeSet<Identity>,
}

/// A menu or sheet appended to the body on behalf of one post.
#[derive(Debug, Clone, Copy)]
struct Overlay {
    node: NodeHandle,
    record: NodeHandle,
}

impl RehearsalSurface {
    pub fn new(dom: HtmlSurface, profile: CompiledProfile) -> Self {
        Self {
            dom,
            profile,
            menu: None,
            sheet: None,
            blocked: BTreeSet::new(),
        }
    }

    pub fn parse(markup: &str, profile: CompiledProfile) -> Self {
        Self::new(HtmlSurface::parse(markup), profile)
    }

    /// Authors blocked through the confirmation sheet so far.
    pub fn blocked(&self) -> &BTreeSet<Identity> {
        &self.blocked
    }

    pub fn dom(&self) -> &HtmlSurface {
        &self.dom
    }

    pub fn dom_mut(&mut self) -> &mut HtmlSurface {
        &mut self.dom
    }

    /// The confirmation sheet currently waiting for an answer.
    pub fn pending_confirmation(&self) -> Option<NodeHandle> {
        self.sheet.map(|sheet| sheet.node)
    }

    /// Answers the open confirmation sheet as a person would. No-op without a sheet.
    pub fn answer_confirmation(&mut self, confirm: bool) -> Result<(), SurfaceError> {
        let Some(sheet) = self.sheet else {
            return Ok(());
        };
        let role = if confirm { "confirm" } else { "cancel" };
        let selector = role_selector(role)?;
        match self.dom.select(Some(sheet.node), &selector).into_iter().next() {
            Some(button) => self.click(button),
            None => Err(SurfaceError::Markup(format!("confirmation sheet has no {role} button"))),
        }
    }

    fn identity_of(&self, record: NodeHandle) -> Option<Identity> {
        extract_record(&self.dom, &self.profile, record).and_then(|record| record.identity)
    }

    fn body(&self) -> Result<NodeHandle, SurfaceError> {
        self.dom
            .body()
            .ok_or_else(|| SurfaceError::Markup("document has no body".into()))
    }

    fn open_menu(&mut self, record: NodeHandle) -> Result<(), SurfaceError> {
        self.close_menu()?;
        let handle = self.handle_label(record);
        let markup = format!(
            r#"<div role="menu" {ROLE_ATTR}="menu"><div role="menuitem" {ROLE_ATTR}="mute">Mute {handle}</div><div role="menuitem" {ROLE_ATTR}="block">Block {handle}</div></div>"#
        );
        let body = self.body()?;
        let added = self.dom.append_html(body, &markup)?;
        self.menu = added.first().map(|node| Overlay {
            node: *node,
            record,
        });
        blocker_debug!("Rehearsal menu opened for {:?}", record);
        Ok(())
    }

    fn close_menu(&mut self) -> Result<(), SurfaceError> {
        match self.menu.take() {
            Some(menu) if self.dom.is_attached(menu.node) => self.dom.remove(menu.node),
            _ => Ok(()),
        }
    }

    fn open_sheet(&mut self) -> Result<(), SurfaceError> {
        let Some(menu) = self.menu else {
            return Ok(());
        };
        self.close_menu()?;
        let handle = self.handle_label(menu.record);
        let markup = format!(
            r#"<div role="dialog" data-testid="confirmationSheetDialog" {ROLE_ATTR}="sheet"><span>Block {handle}?</span><button role="button" {ROLE_ATTR}="cancel">Cancel</button><button role="button" data-testid="confirmationSheetConfirm" {ROLE_ATTR}="confirm">Block</button></div>"#
        );
        let body = self.body()?;
        let added = self.dom.append_html(body, &markup)?;
        self.sheet = added.first().map(|node| Overlay {
            node: *node,
            record: menu.record,
        });
        Ok(())
    }

    fn close_sheet(&mut self) -> Result<Option<Overlay>, SurfaceError> {
        let Some(sheet) = self.sheet.take() else {
            return Ok(None);
        };
        if self.dom.is_attached(sheet.node) {
            self.dom.remove(sheet.node)?;
        }
        Ok(Some(sheet))
    }

    fn confirm(&mut self) -> Result<(), SurfaceError> {
        let Some(sheet) = self.close_sheet()? else {
            return Ok(());
        };
        let Some(identity) = self.identity_of(sheet.record) else {
            return Ok(());
        };
        let records = self.dom.select(None, &self.profile.record);
        for record in records {
            if self.identity_of(record).as_ref() == Some(&identity) {
                self.dom.remove(record)?;
            }
        }
        blocker_info!("Rehearsal feed blocked {}", identity);
        self.blocked.insert(identity);
        Ok(())
    }

    fn handle_label(&self, record: NodeHandle) -> String {
        self.identity_of(record)
            .map(|identity| format!("@{identity}"))
            .unwrap_or_default()
    }
}

fn role_selector(role: &str) -> Result<Selector, SurfaceError> {
    Selector::parse(&format!(r#"[{ROLE_ATTR}="{role}"]"#))
        .map_err(|err| SurfaceError::Markup(err.to_string()))
}

impl Surface for RehearsalSurface {
    fn select(&self, scope: Option<NodeHandle>, selector: &Selector) -> Vec<NodeHandle> {
        self.dom.select(scope, selector)
    }

    fn matches(&self, node: NodeHandle, selector: &Selector) -> bool {
        self.dom.matches(node, selector)
    }

    fn closest(&self, node: NodeHandle, selector: &Selector) -> Option<NodeHandle> {
        self.dom.closest(node, selector)
    }

    fn text(&self, node: NodeHandle) -> Result<String, SurfaceError> {
        self.dom.text(node)
    }

    fn attr(&self, node: NodeHandle, name: &str) -> Result<Option<String>, SurfaceError> {
        self.dom.attr(node, name)
    }

    fn is_attached(&self, node: NodeHandle) -> bool {
        self.dom.is_attached(node)
    }

    fn click(&mut self, node: NodeHandle) -> Result<(), SurfaceError> {
        self.dom.click(node)?;
        match self.dom.attr(node, ROLE_ATTR)?.as_deref() {
            Some("block") => self.open_sheet(),
            Some("confirm") => self.confirm(),
            Some("cancel") => self.close_sheet().map(|_| ()),
            Some(_) => self.close_menu(),
            None => match self.dom.closest(node, &self.profile.record) {
                Some(record) => self.open_menu(record),
                None => Ok(()),
            },
        }
    }

    fn take_mutations(&mut self) -> Vec<Mutation> {
        self.dom.take_mutations()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body><main>
        <article data-testid="tweet">
          <div data-testid="User-Name"><a href="/SpamBot">Spam Bot</a></div>
          <div data-testid="tweetText">hello</div>
          <button data-testid="caret">...</button>
        </article>
        <article data-testid="tweet">
          <div data-testid="User-Name"><a href="/spambot">Spam Bot</a></div>
          <button data-testid="caret">...</button>
        </article>
    </main></body></html>"#;

    fn selector(css: &str) -> Selector {
        Selector::parse(css).unwrap()
    }

    #[test]
    fn full_click_sequence_removes_the_authors_posts() {
        let mut surface = RehearsalSurface::parse(PAGE, CompiledProfile::live_feed().unwrap());
        let caret = surface.select(None, &selector(r#"[data-testid="caret"]"#))[0];

        surface.click(caret).unwrap();
        let block = surface.select(None, &selector(r#"[role="menuitem"]"#))[1];
        assert_eq!(surface.text(block).unwrap(), "Block @spambot");

        surface.click(block).unwrap();
        assert!(surface.select(None, &selector(r#"[role="menu"]"#)).is_empty());
        assert!(surface.pending_confirmation().is_some());

        surface.answer_confirmation(true).unwrap();
        assert_eq!(surface.pending_confirmation(), None);
        assert!(surface.select(None, &selector("article")).is_empty());
        assert!(surface.blocked().contains(&Identity::new("spambot").unwrap()));
    }

    #[test]
    fn cancel_keeps_the_posts() {
        let mut surface = RehearsalSurface::parse(PAGE, CompiledProfile::live_feed().unwrap());
        let caret = surface.select(None, &selector(r#"[data-testid="caret"]"#))[0];
        surface.click(caret).unwrap();
        let block = surface.select(None, &selector(r#"[data-rehearsal="block"]"#))[0];
        surface.click(block).unwrap();

        surface.answer_confirmation(false).unwrap();

        assert_eq!(surface.select(None, &selector("article")).len(), 2);
        assert!(surface.blocked().is_empty());
    }
}
