pub mod home {
    use std::collections::BTreeSet;

    use gloo_timers::callback::Timeout;
    use tracing::{info, warn};
    use yew::prelude::*;

    use crate::api::{self, ApiFailure, FieldErrors, UserDraft, UserInfo};
    use crate::user_components::form::UserForm;
    use crate::user_components::table::{SortColumn, SortState, UserTable};
    use crate::validation;

    const NOTICE_TIMEOUT_MS: u32 = 3_000;

    #[derive(Clone, Debug, PartialEq)]
    enum Notice {
        Success(String),
        Error(String),
    }

    fn confirm(message: &str) -> bool {
        web_sys::window()
            .and_then(|window| window.confirm_with_message(message).ok())
            .unwrap_or(false)
    }

    #[function_component]
    pub fn Home() -> Html {
        let users = use_state(Vec::<UserInfo>::new);
        let sort = use_state(SortState::default);
        let selected = use_state(BTreeSet::<i32>::new);
        let editing = use_state(|| None::<UserInfo>);
        let field_errors = use_state(FieldErrors::new);
        let notice = use_state(|| None::<Notice>);
        let reload = use_state(|| 0u32);
        let generation = use_state(|| 0u32);

        // Fetch users on mount and whenever `reload` is bumped
        {
            let users = users.clone();
            let selected = selected.clone();
            let notice = notice.clone();
            use_effect_with_deps(
                move |_| {
                    wasm_bindgen_futures::spawn_local(async move {
                        match api::fetch_users().await {
                            Ok(list) => {
                                info!(count = list.len(), "Loaded users");
                                let ids: BTreeSet<i32> = list.iter().map(|user| user.id).collect();
                                selected.set(selected.intersection(&ids).copied().collect());
                                users.set(list);
                            }
                            Err(failure) => {
                                warn!("Failed to load users: {:?}", failure);
                                notice.set(Some(Notice::Error(
                                    "Unable to load users. Please try again later.".to_string(),
                                )));
                            }
                        }
                    });
                    || ()
                },
                *reload,
            );
        }

        // Success notices clear themselves; errors stay until replaced
        {
            let notice_handle = notice.clone();
            use_effect_with_deps(
                move |current: &Option<Notice>| {
                    let timeout = match current {
                        Some(Notice::Success(_)) => Some(Timeout::new(NOTICE_TIMEOUT_MS, move || {
                            notice_handle.set(None)
                        })),
                        _ => None,
                    };
                    move || drop(timeout)
                },
                (*notice).clone(),
            );
        }

        let on_submit = {
            let editing = editing.clone();
            let field_errors = field_errors.clone();
            let notice = notice.clone();
            let reload = reload.clone();
            let generation = generation.clone();
            Callback::from(move |draft: UserDraft| {
                let local_errors = validation::validate(&draft);
                if !local_errors.is_empty() {
                    field_errors.set(local_errors);
                    return;
                }

                let id = (*editing).as_ref().map(|user| user.id);
                let editing = editing.clone();
                let field_errors = field_errors.clone();
                let notice = notice.clone();
                let reload = reload.clone();
                let generation = generation.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    match api::save_user(id, &draft).await {
                        Ok(user) => {
                            info!(id = user.id, "Saved user");
                            let message = if id.is_some() {
                                "User updated successfully"
                            } else {
                                "User added successfully"
                            };
                            field_errors.set(FieldErrors::new());
                            editing.set(None);
                            generation.set(*generation + 1);
                            notice.set(Some(Notice::Success(message.to_string())));
                            reload.set(*reload + 1);
                        }
                        Err(ApiFailure::Fields(errors)) => field_errors.set(errors),
                        Err(ApiFailure::Message(message)) => {
                            field_errors.set(FieldErrors::new());
                            notice.set(Some(Notice::Error(message)));
                        }
                    }
                });
            })
        };

        let on_cancel = {
            let editing = editing.clone();
            let field_errors = field_errors.clone();
            Callback::from(move |_: ()| {
                editing.set(None);
                field_errors.set(FieldErrors::new());
            })
        };

        let on_edit = {
            let editing = editing.clone();
            let field_errors = field_errors.clone();
            Callback::from(move |user: UserInfo| {
                field_errors.set(FieldErrors::new());
                editing.set(Some(user));
            })
        };

        let on_delete = {
            let editing = editing.clone();
            let notice = notice.clone();
            let reload = reload.clone();
            Callback::from(move |id: i32| {
                if !confirm("Are you sure you want to delete this user?") {
                    return;
                }
                let editing = editing.clone();
                let notice = notice.clone();
                let reload = reload.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    match api::delete_user(id).await {
                        Ok(()) => {
                            if (*editing).as_ref().map(|user| user.id) == Some(id) {
                                editing.set(None);
                            }
                            notice.set(Some(Notice::Success("User deleted successfully".to_string())));
                            reload.set(*reload + 1);
                        }
                        Err(failure) => notice.set(Some(Notice::Error(failure.message()))),
                    }
                });
            })
        };

        let on_bulk_delete = {
            let selected = selected.clone();
            let editing = editing.clone();
            let notice = notice.clone();
            let reload = reload.clone();
            Callback::from(move |_: MouseEvent| {
                let ids: Vec<i32> = selected.iter().copied().collect();
                if ids.is_empty()
                    || !confirm(&format!("Are you sure you want to delete {} users?", ids.len()))
                {
                    return;
                }
                let editing = editing.clone();
                let notice = notice.clone();
                let reload = reload.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    let mut failed = 0;
                    for &id in &ids {
                        if let Err(failure) = api::delete_user(id).await {
                            warn!(id, "Failed to delete user: {:?}", failure);
                            failed += 1;
                        }
                    }
                    if (*editing).as_ref().map_or(false, |user| ids.contains(&user.id)) {
                        editing.set(None);
                    }
                    let deleted = ids.len() - failed;
                    notice.set(Some(if failed == 0 {
                        Notice::Success(format!("{} users deleted successfully", deleted))
                    } else {
                        Notice::Error(format!("Deleted {} users, {} failed", deleted, failed))
                    }));
                    reload.set(*reload + 1);
                });
            })
        };

        let on_sort = {
            let sort = sort.clone();
            Callback::from(move |column: SortColumn| sort.set(sort.toggle(column)))
        };

        let on_toggle = {
            let selected = selected.clone();
            Callback::from(move |id: i32| {
                let mut next = (*selected).clone();
                if !next.remove(&id) {
                    next.insert(id);
                }
                selected.set(next);
            })
        };

        let on_toggle_all = {
            let selected = selected.clone();
            let users = users.clone();
            Callback::from(move |checked: bool| {
                if checked {
                    selected.set(users.iter().map(|user| user.id).collect());
                } else {
                    selected.set(BTreeSet::new());
                }
            })
        };

        let mut sorted = (*users).clone();
        sort.apply(&mut sorted);

        html! {
            <div class="home-container">
                <h1>{"User Management"}</h1>
                {
                    match (*notice).as_ref() {
                        Some(Notice::Success(message)) => html! { <div class="notice success">{message}</div> },
                        Some(Notice::Error(message)) => html! { <div class="notice error">{message}</div> },
                        None => html! {},
                    }
                }
                <h2>{ if editing.is_some() { "Edit user" } else { "Add user" } }</h2>
                <UserForm
                    editing={(*editing).clone()}
                    generation={*generation}
                    errors={(*field_errors).clone()}
                    {on_submit}
                    {on_cancel}
                />
                <div class="users-list">
                    <h2>{"Users"}</h2>
                    <button onclick={on_bulk_delete} disabled={selected.is_empty()}>
                        { format!("Delete selected ({})", selected.len()) }
                    </button>
                    <UserTable
                        users={sorted}
                        sort={*sort}
                        selected={(*selected).clone()}
                        {on_sort}
                        {on_toggle}
                        {on_toggle_all}
                        {on_edit}
                        {on_delete}
                    />
                </div>
            </div>
        }
    }
}

pub mod not_found {
    use yew::prelude::*;
    use yew_router::prelude::*;

    use crate::Route;

    #[function_component]
    pub fn NotFound() -> Html {
        html! {
            <div class="not-found">
                <h1>{"Not found"}</h1>
                <Link<Route> to={Route::Home}>{"Back to users"}</Link<Route>>
            </div>
        }
    }
}
