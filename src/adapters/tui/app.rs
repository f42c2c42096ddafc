//! Dashboard State
//!
//! Owns the view state of the terminal dashboard. Wallet calls run in
//! spawned tasks and come back as `AppEvent`s, so rendering never waits on
//! the wallet.

use std::sync::Arc;
use chrono::Utc;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind};
use ratatui::layout::Rect;
use tokio::sync::mpsc;

use crate::application::token_table::{self, BuyOutcome, TokenTableView};
use crate::application::wallet_widget::{address_button_label, ConnectOutcome, WalletStatusView, WalletWidget};
use crate::application::{FetchTrigger, TokenPoller, TokenSnapshot};
use crate::domain::{Address, BalanceSnapshot, ChainId, ConnectorInfo, SignRequest, WalletSession};
use crate::ports::{SessionContext, WalletError, WalletPort};
use super::menu::{MouseDownListeners, WalletMenu};
use super::ui;

/// Results of spawned wallet operations
#[derive(Debug)]
pub enum AppEvent {
    Connected(Result<WalletSession, WalletError>),
    Signed(SignRequest, Result<String, WalletError>),
    Switched(Result<(), WalletError>),
    Balance((Address, ChainId), Result<BalanceSnapshot, WalletError>),
    Disconnected(Result<(), WalletError>),
}

/// One entry of the wallet menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuItem {
    Connector(ConnectorInfo),
    Disconnect,
}

pub struct App {
    pub should_quit: bool,
    poller: TokenPoller,
    widget: WalletWidget,
    wallet: Arc<dyn WalletPort>,
    connectors: Vec<ConnectorInfo>,
    listeners: MouseDownListeners,
    menu: WalletMenu,
    snapshot: TokenSnapshot,
    selected_row: usize,
    alert: Option<String>,
    viewport: Rect,
    tx: mpsc::UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(poller: TokenPoller, widget: WalletWidget, tx: mpsc::UnboundedSender<AppEvent>) -> Self {
        let wallet = widget.wallet();
        let connectors = wallet.connectors();
        let snapshot = poller.snapshot();
        Self {
            should_quit: false,
            poller,
            widget,
            wallet,
            connectors,
            listeners: MouseDownListeners::new(),
            menu: WalletMenu::new(),
            snapshot,
            selected_row: 0,
            alert: None,
            viewport: Rect::default(),
            tx,
        }
    }

    pub fn poller(&self) -> &TokenPoller {
        &self.poller
    }

    pub fn session(&self) -> WalletSession {
        self.widget.session()
    }

    pub fn session_context(&self) -> SessionContext {
        self.widget.session_context()
    }

    pub fn wallet(&self) -> Arc<dyn WalletPort> {
        self.wallet.clone()
    }

    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn is_menu_open(&self) -> bool {
        self.menu.is_open()
    }

    pub fn menu_selected(&self) -> usize {
        self.menu.selected()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn selected_row(&self) -> usize {
        self.selected_row
    }

    pub fn last_connect_error(&self) -> Option<&str> {
        self.widget.last_connect_error()
    }

    pub fn table_view(&self) -> TokenTableView {
        TokenTableView::build(&self.snapshot, Utc::now())
    }

    pub fn wallet_view(&self) -> Option<WalletStatusView> {
        self.widget.status_view()
    }

    pub fn address_label(&self) -> String {
        address_button_label(&self.widget.session())
    }

    pub fn refresh_interval_secs(&self) -> u64 {
        self.poller.policy().refetch_interval.as_secs()
    }

    pub fn menu_items(&self) -> Vec<MenuItem> {
        if self.widget.session().is_connected() {
            vec![MenuItem::Disconnect]
        } else {
            self.connectors.iter().cloned().map(MenuItem::Connector).collect()
        }
    }

    /// Record the terminal area after a draw
    pub fn set_viewport(&mut self, area: Rect) {
        self.viewport = area;
        let menu_area = ui::menu_area(area, self.menu_items().len());
        self.menu.set_area(&mut self.listeners, menu_area);
    }

    pub fn set_snapshot(&mut self, snapshot: TokenSnapshot) {
        self.selected_row = self.selected_row.min(snapshot.tokens.len().saturating_sub(1));
        self.snapshot = snapshot;
    }

    /// The wallet session changed outside our own requests
    pub fn on_session_changed(&mut self) {
        if self.widget.observe_session() {
            tracing::debug!("Verification reset after session change");
        }
        self.request_balance();
    }

    pub fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Connected(result) => match self.widget.apply_connect(&result) {
                ConnectOutcome::Connected => self.menu.close(&mut self.listeners),
                ConnectOutcome::Alert(text) => self.alert = Some(text),
                ConnectOutcome::Rejected => {}
            },
            AppEvent::Signed(request, result) => {
                self.widget.apply_signature(&request, result);
            }
            AppEvent::Switched(result) => self.widget.apply_switch(result),
            AppEvent::Balance(query, result) => self.widget.apply_balance(&query, result),
            AppEvent::Disconnected(result) => {
                if let Err(e) = result {
                    tracing::warn!("Disconnect failed: {}", e);
                }
                self.widget.observe_session();
            }
        }
        self.request_balance();
    }

    pub async fn handle_terminal_event(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key).await,
            Event::Mouse(mouse) => {
                if let MouseEventKind::Down(_) = mouse.kind {
                    self.menu.on_mouse_down(&mut self.listeners, mouse.column, mouse.row);
                }
            }
            Event::FocusGained => {
                self.poller.on_focus().await;
            }
            Event::Resize(width, height) => self.set_viewport(Rect::new(0, 0, width, height)),
            _ => {}
        }
    }

    async fn handle_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.quit();
            return;
        }

        // A blocking alert swallows the next key
        if self.alert.take().is_some() {
            return;
        }

        if self.menu.is_open() {
            self.handle_menu_key(key.code);
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.quit(),
            KeyCode::Up | KeyCode::Char('k') => self.selected_row = self.selected_row.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected_row + 1 < self.snapshot.tokens.len() {
                    self.selected_row += 1;
                }
            }
            KeyCode::Enter | KeyCode::Char('b') => self.buy_selected(),
            KeyCode::Char('w') => {
                self.menu.toggle(&mut self.listeners);
                self.set_viewport(self.viewport);
            }
            KeyCode::Char('r') => {
                self.poller.invalidate().await;
            }
            KeyCode::Char('v') => self.start_verify(),
            KeyCode::Char('s') => self.start_switch(),
            _ => {}
        }
    }

    fn handle_menu_key(&mut self, code: KeyCode) {
        let items = self.menu_items();
        match code {
            KeyCode::Esc | KeyCode::Char('w') => self.menu.close(&mut self.listeners),
            KeyCode::Up | KeyCode::Char('k') => self.menu.select_previous(items.len()),
            KeyCode::Down | KeyCode::Char('j') => self.menu.select_next(items.len()),
            KeyCode::Enter => match items.get(self.menu.selected()) {
                Some(MenuItem::Connector(connector)) => self.start_connect(&connector.id),
                Some(MenuItem::Disconnect) => {
                    self.menu.close(&mut self.listeners);
                    self.start_disconnect();
                }
                None => {}
            },
            _ => {}
        }
    }

    pub fn quit(&mut self) {
        self.menu.unmount(&mut self.listeners);
        self.should_quit = true;
    }

    fn buy_selected(&mut self) {
        let Some(token) = self.snapshot.tokens.get(self.selected_row) else {
            return;
        };
        let outcome = token_table::buy(&token.display_symbol(), &self.widget.session());
        if let BuyOutcome::Placeholder(_) = outcome {
            tracing::info!("Buy requested for {}", token.display_symbol());
        }
        self.alert = outcome.message();
    }

    fn start_connect(&mut self, connector_id: &str) {
        if self.widget.session().is_connecting() {
            return;
        }
        let wallet = self.wallet.clone();
        let tx = self.tx.clone();
        let id = connector_id.to_string();
        tokio::spawn(async move {
            let result = wallet.connect(&id).await;
            let _ = tx.send(AppEvent::Connected(result));
        });
    }

    fn start_disconnect(&mut self) {
        let wallet = self.wallet.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = wallet.disconnect().await;
            let _ = tx.send(AppEvent::Disconnected(result));
        });
    }

    fn start_verify(&mut self) {
        let Some(request) = self.widget.begin_verify(Utc::now()) else {
            return;
        };
        let wallet = self.wallet.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = wallet.sign_message(&request.message).await;
            let _ = tx.send(AppEvent::Signed(request, result));
        });
    }

    fn start_switch(&mut self) {
        let Some(chain) = self.widget.begin_switch() else {
            return;
        };
        let wallet = self.wallet.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = wallet.switch_chain(chain).await;
            let _ = tx.send(AppEvent::Switched(result));
        });
    }

    fn request_balance(&mut self) {
        let Some(query) = self.widget.balance_request() else {
            return;
        };
        let wallet = self.wallet.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = wallet.get_balance(&query.0, query.1).await;
            let _ = tx.send(AppEvent::Balance(query, result));
        });
    }

    /// Kick off the first token fetch without waiting for the timer task
    pub async fn start(&mut self) {
        self.poller.trigger(FetchTrigger::Initial).await;
        self.on_session_changed();
    }
}
