//! Page bindings (wasm32 only)
//!
//! Adapts the page's wallet-connection library, its globals and the
//! document root to the bridge traits, and exports `WalletBridge` to JS.

use crate::environment::BrowserEnvironment;
use crate::receiver::{GlobalScope, resolve_in_order};
use crate::session::BridgeSession;
use crate::theme::StyleTarget;
use crate::wallet::{
    Account, ConnectedWallet, LibraryConfig, ProviderRequest, WalletLibrary,
    WalletLibraryFactory, WalletProvider,
};
use async_trait::async_trait;
use js_sys::{Array, Function, Object, Promise, Reflect};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, future_to_promise};
use web_sys::HtmlElement;
use web3_bridge_core::{
    BridgeError, InitOptions, MessageReceiver, ReceiverWiring, ReplyTarget, Result,
    ThemeDescriptor,
};

fn js_error(value: JsValue) -> BridgeError {
    let message = Reflect::get(&value, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .or_else(|| value.as_string())
        .unwrap_or_default();
    BridgeError::Library(message)
}

fn to_js_error(err: BridgeError) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}

fn get(target: &JsValue, key: &str) -> Result<JsValue> {
    Reflect::get(target, &JsValue::from_str(key)).map_err(js_error)
}

fn set(target: &Object, key: &str, value: &JsValue) -> Result<()> {
    Reflect::set(target, &JsValue::from_str(key), value)
        .map(|_| ())
        .map_err(js_error)
}

fn call_method(target: &JsValue, name: &str, args: &Array) -> Result<JsValue> {
    let method: Function = get(target, name)?
        .dyn_into()
        .map_err(|_| BridgeError::Library(format!("{} is not a function", name)))?;
    method.apply(target, args).map_err(js_error)
}

async fn settle(value: JsValue) -> Result<JsValue> {
    if value.is_instance_of::<Promise>() {
        JsFuture::from(Promise::from(value)).await.map_err(js_error)
    } else {
        Ok(value)
    }
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| BridgeError::SerializationError(e.to_string()))
}

fn has_send_message(target: &JsValue) -> bool {
    get(target, "SendMessage")
        .map(|f| f.is_function())
        .unwrap_or(false)
}

fn present(value: JsValue) -> Option<JsValue> {
    (!value.is_undefined() && !value.is_null()).then_some(value)
}

/// Page object exposing `SendMessage(object, method, payload)`
pub struct JsReceiver {
    target: JsValue,
}

impl JsReceiver {
    pub fn new(target: JsValue) -> Self {
        Self { target }
    }
}

impl MessageReceiver for JsReceiver {
    fn can_send(&self) -> bool {
        has_send_message(&self.target)
    }

    fn send_message(&self, object: &str, method: &str, payload: &str) -> Result<()> {
        let send: Function = get(&self.target, "SendMessage")?
            .dyn_into()
            .map_err(|_| BridgeError::Receiver("SendMessage is not a function".into()))?;
        send.call3(
            &self.target,
            &JsValue::from_str(object),
            &JsValue::from_str(method),
            &JsValue::from_str(payload),
        )
        .map(|_| ())
        .map_err(|e| BridgeError::Receiver(js_error(e).to_string()))
    }
}

/// Property lookup from `globalThis`
pub struct WindowGlobals;

impl WindowGlobals {
    /// Raw value at `path`, if every step exists
    pub fn value_at(path: &[&str]) -> Option<JsValue> {
        let mut current: JsValue = js_sys::global().into();
        for key in path {
            current = present(Reflect::get(&current, &JsValue::from_str(key)).ok()?)?;
        }
        Some(current)
    }
}

impl GlobalScope for WindowGlobals {
    fn receiver_at(&self, path: &[&str]) -> Option<Rc<dyn MessageReceiver>> {
        Self::value_at(path).map(|value| Rc::new(JsReceiver::new(value)) as Rc<dyn MessageReceiver>)
    }
}

/// Inline style of `document.documentElement`
pub struct DocumentRootStyle {
    root: HtmlElement,
}

impl DocumentRootStyle {
    pub fn from_window() -> Option<Self> {
        let root = web_sys::window()?.document()?.document_element()?;
        root.dyn_into::<HtmlElement>().ok().map(|root| Self { root })
    }
}

impl StyleTarget for DocumentRootStyle {
    fn set_property(&self, key: &str, value: &str) -> Result<()> {
        self.root
            .style()
            .set_property(key, value)
            .map_err(|e| BridgeError::Style(js_error(e).to_string()))
    }
}

/// EIP-1193 provider object
pub struct JsProvider {
    provider: JsValue,
}

#[async_trait(?Send)]
impl WalletProvider for JsProvider {
    async fn request(&self, request: ProviderRequest) -> Result<serde_json::Value> {
        let args = to_js(&request)?;
        let pending = call_method(&self.provider, "request", &Array::of1(&args))?;
        let value = settle(pending).await?;
        if value.is_undefined() {
            return Ok(serde_json::Value::Null);
        }
        serde_wasm_bindgen::from_value(value)
            .map_err(|e| BridgeError::SerializationError(e.to_string()))
    }
}

fn wallet_from_js(value: &JsValue) -> Result<ConnectedWallet> {
    let label = get(value, "label")?.as_string().unwrap_or_default();
    let accounts_js = get(value, "accounts")?;
    let accounts = if Array::is_array(&accounts_js) {
        Array::from(&accounts_js)
            .iter()
            .filter_map(|account| get(&account, "address").ok()?.as_string())
            .map(|address| Account { address })
            .collect()
    } else {
        Vec::new()
    };
    let provider = get(value, "provider")?;

    Ok(ConnectedWallet {
        label,
        accounts,
        provider: Rc::new(JsProvider { provider }),
    })
}

fn wallets_from_js(value: &JsValue) -> Result<Vec<ConnectedWallet>> {
    if !Array::is_array(value) {
        return Ok(Vec::new());
    }
    Array::from(value)
        .iter()
        .map(|wallet| wallet_from_js(&wallet))
        .collect()
}

/// Handle returned by the library's constructor
pub struct JsWalletLibrary {
    onboard: JsValue,
}

#[async_trait(?Send)]
impl WalletLibrary for JsWalletLibrary {
    async fn connect_wallet(&self) -> Result<Vec<ConnectedWallet>> {
        let pending = call_method(&self.onboard, "connectWallet", &Array::new())?;
        let wallets = settle(pending).await?;
        wallets_from_js(&wallets)
    }

    fn connected_wallets(&self) -> Result<Vec<ConnectedWallet>> {
        let state = get(&self.onboard, "state")?;
        let snapshot = call_method(&state, "get", &Array::new())?;
        wallets_from_js(&get(&snapshot, "wallets")?)
    }

    async fn disconnect_wallet(&self, label: &str) -> Result<()> {
        let arg = Object::new();
        set(&arg, "label", &JsValue::from_str(label))?;
        let pending = call_method(&self.onboard, "disconnectWallet", &Array::of1(&arg))?;
        settle(pending).await?;
        Ok(())
    }
}

/// Library constructor and module builders loaded by the page
pub struct JsWalletFactory {
    onboard: Function,
    injected: Function,
    wallet_connect: Option<Function>,
    /// Module objects passed to `init` directly; JSON cannot carry them
    supplied: RefCell<Vec<JsValue>>,
}

impl WalletLibraryFactory for JsWalletFactory {
    type Module = JsValue;
    type Library = JsWalletLibrary;

    fn injected_module(&self) -> Result<JsValue> {
        self.injected.call0(&JsValue::NULL).map_err(js_error)
    }

    fn wallet_connect_module(&self, project_id: &str) -> Result<JsValue> {
        let build = self
            .wallet_connect
            .as_ref()
            .ok_or_else(|| BridgeError::Library("WalletConnect module not loaded".into()))?;
        let options = Object::new();
        set(&options, "projectId", &JsValue::from_str(project_id))?;
        build.call1(&JsValue::NULL, &options).map_err(js_error)
    }

    /// Index placeholders refer to `supplied`; anything else is converted
    fn custom_module(&self, raw: serde_json::Value) -> Result<JsValue> {
        if let Some(module) = raw
            .as_u64()
            .and_then(|index| self.supplied.borrow().get(index as usize).cloned())
        {
            return Ok(module);
        }
        to_js(&raw)
    }

    fn create(&self, config: LibraryConfig<JsValue>) -> Result<JsWalletLibrary> {
        let wallets: Array = config.wallets.iter().collect();
        let options = Object::new();
        set(&options, "wallets", &wallets)?;
        set(&options, "chains", &to_js(&config.chains)?)?;
        set(&options, "appMetadata", &to_js(&config.app_metadata)?)?;

        let onboard = self.onboard.call1(&JsValue::NULL, &options).map_err(js_error)?;
        self.supplied.borrow_mut().clear();
        Ok(JsWalletLibrary { onboard })
    }
}

/// Split page-supplied options into what JSON can carry and what it cannot
fn options_from_js(
    factory: &JsWalletFactory,
    options: &JsValue,
) -> Result<(InitOptions, Option<JsValue>)> {
    if options.is_undefined() || options.is_null() {
        return Ok((InitOptions::default(), None));
    }

    let plain = Object::assign(&Object::new(), &Object::from(options.clone()));
    Reflect::delete_property(&plain, &JsValue::from_str("wallets")).map_err(js_error)?;
    Reflect::delete_property(&plain, &JsValue::from_str("unity")).map_err(js_error)?;
    let json = js_sys::JSON::stringify(&plain)
        .map_err(js_error)?
        .as_string()
        .unwrap_or_else(|| "{}".into());
    let mut parsed = InitOptions::from_json(&json)?;

    let wallets = get(options, "wallets")?;
    if Array::is_array(&wallets) {
        let supplied: Vec<JsValue> = Array::from(&wallets).iter().collect();
        parsed.wallets = (0..supplied.len()).map(serde_json::Value::from).collect();
        *factory.supplied.borrow_mut() = supplied;
    }

    let mut instance = None;
    let unity = get(options, "unity")?;
    if unity.is_object() {
        instance = present(get(&unity, "instance")?);
        let game_object_name = get(&unity, "gameObjectName")?.as_string();
        parsed.unity = Some(ReceiverWiring {
            instance: instance
                .clone()
                .map(|value| Rc::new(JsReceiver::new(value)) as Rc<dyn MessageReceiver>),
            game_object_name,
        });
    }

    Ok((parsed, instance))
}

/// Explicitly constructed bridge, exported to the page
#[wasm_bindgen]
pub struct WalletBridge {
    session: Rc<BridgeSession<JsWalletFactory>>,
    /// Page object behind the session's explicit receiver
    instance: RefCell<Option<JsValue>>,
}

#[wasm_bindgen]
impl WalletBridge {
    #[wasm_bindgen(constructor)]
    pub fn new(
        onboard: Function,
        injected_module: Function,
        wallet_connect_module: Option<Function>,
    ) -> WalletBridge {
        let factory = JsWalletFactory {
            onboard,
            injected: injected_module,
            wallet_connect: wallet_connect_module,
            supplied: RefCell::new(Vec::new()),
        };
        let style = DocumentRootStyle::from_window().map(|s| Rc::new(s) as Rc<dyn StyleTarget>);
        let environment = BrowserEnvironment::new(Rc::new(WindowGlobals), style);
        WalletBridge {
            session: Rc::new(BridgeSession::new(factory, environment)),
            instance: RefCell::new(None),
        }
    }

    pub fn init(&self, options: JsValue) -> std::result::Result<bool, JsValue> {
        if self.session.is_initialized() {
            return Ok(true);
        }
        let (parsed, instance) =
            options_from_js(self.session.factory(), &options).map_err(to_js_error)?;
        self.session.init(parsed).map_err(to_js_error)?;
        if instance.is_some() {
            *self.instance.borrow_mut() = instance;
        }
        Ok(true)
    }

    /// Throws when uninitialized; otherwise resolves to the connected address
    pub fn connect(&self) -> std::result::Result<Promise, JsValue> {
        if !self.session.is_initialized() {
            return Err(to_js_error(BridgeError::NotInitialized));
        }
        let session = self.session.clone();
        Ok(future_to_promise(async move {
            let wallet = session.connect().await.map_err(to_js_error)?;
            Ok(JsValue::from_str(wallet.primary_address().unwrap_or_default()))
        }))
    }

    pub fn disconnect(&self) -> std::result::Result<Promise, JsValue> {
        if !self.session.is_initialized() {
            return Err(to_js_error(BridgeError::NotInitialized));
        }
        let session = self.session.clone();
        Ok(future_to_promise(async move {
            session.disconnect().await.map_err(to_js_error)?;
            Ok(JsValue::UNDEFINED)
        }))
    }

    #[wasm_bindgen(js_name = signMessage)]
    pub fn sign_message(&self, message: String) -> Promise {
        let session = self.session.clone();
        future_to_promise(async move {
            let signature = session.sign_message(&message).await.map_err(to_js_error)?;
            Ok(JsValue::from_str(&signature))
        })
    }

    /// Sign `message` and also deliver a JSON `SignResult` to
    /// `receiver.method`; resolves to the signature
    #[wasm_bindgen(js_name = signMessageTo)]
    pub fn sign_message_to(
        &self,
        message: String,
        receiver: String,
        method: String,
        request_id: Option<String>,
    ) -> std::result::Result<Promise, JsValue> {
        if receiver.trim().is_empty() || method.trim().is_empty() {
            return Err(to_js_error(BridgeError::InvalidArgument(
                "receiver and method are required".into(),
            )));
        }
        let mut reply = ReplyTarget::new(receiver, method);
        if let Some(request_id) = request_id.filter(|id| !id.is_empty()) {
            reply = reply.with_request_id(request_id);
        }

        let session = self.session.clone();
        Ok(future_to_promise(async move {
            let signature = session
                .sign_message_for(&message, &reply)
                .await
                .map_err(to_js_error)?;
            Ok(JsValue::from_str(&signature))
        }))
    }

    #[wasm_bindgen(js_name = setUnityInstance)]
    pub fn set_unity_instance(&self, instance: JsValue) {
        let instance = present(instance);
        let receiver = instance
            .clone()
            .map(|value| Rc::new(JsReceiver::new(value)) as Rc<dyn MessageReceiver>);
        self.session.set_receiver(receiver);
        *self.instance.borrow_mut() = instance;
    }

    /// The page object outbound messages currently go to, or `null`
    #[wasm_bindgen(js_name = getUnity)]
    pub fn get_unity(&self) -> JsValue {
        let explicit = self.instance.borrow().clone();
        resolve_in_order(explicit, WindowGlobals::value_at, has_send_message)
            .unwrap_or(JsValue::NULL)
    }

    #[wasm_bindgen(js_name = setGameObjectName)]
    pub fn set_game_object_name(&self, name: String) {
        self.session.set_receiver_name(&name);
    }

    #[wasm_bindgen(js_name = applyTheme)]
    pub fn apply_theme(&self, theme: JsValue) -> std::result::Result<(), JsValue> {
        if theme.is_undefined() || theme.is_null() {
            return Ok(());
        }
        let json = js_sys::JSON::stringify(&theme)?
            .as_string()
            .unwrap_or_else(|| "{}".into());
        let theme = ThemeDescriptor::from_json(&json).map_err(to_js_error)?;
        self.session.apply_theme(&theme);
        Ok(())
    }

    #[wasm_bindgen(js_name = sendToUnity)]
    pub fn send_to_unity(&self, method: String, payload: Option<String>) {
        let object = self.session.receiver_name();
        self.session
            .send_to_receiver(&object, &method, payload.as_deref().unwrap_or(""));
    }
}
