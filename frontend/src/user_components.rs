pub mod form {
    use yew::prelude::*;
    use web_sys::HtmlInputElement;

    use crate::api::{FieldErrors, UserDraft, UserInfo};

    #[derive(Properties, PartialEq)]
    pub struct UserFormProps {
        /// The row being edited; `None` means the form creates a new user.
        pub editing: Option<UserInfo>,
        /// Bumped by the parent to clear the form after a successful save.
        pub generation: u32,
        pub errors: FieldErrors,
        pub on_submit: Callback<UserDraft>,
        pub on_cancel: Callback<()>,
    }

    fn field(
        name: &'static str,
        label: &'static str,
        kind: &'static str,
        value: &str,
        errors: &FieldErrors,
        oninput: Callback<InputEvent>,
    ) -> Html {
        html! {
            <div class="field">
                <label for={name}>{label}</label>
                <input id={name} name={name} type={kind} value={value.to_string()} {oninput} />
                {
                    if let Some(message) = errors.get(name) {
                        html! { <div class="field-error">{message}</div> }
                    } else {
                        html! {}
                    }
                }
            </div>
        }
    }

    #[function_component]
    pub fn UserForm(props: &UserFormProps) -> Html {
        let draft = use_state(UserDraft::default);

        {
            let draft = draft.clone();
            use_effect_with_deps(
                move |(editing, _): &(Option<UserInfo>, u32)| {
                    draft.set(editing.as_ref().map(UserDraft::from).unwrap_or_default());
                    || ()
                },
                (props.editing.clone(), props.generation),
            );
        }

        let setter = |apply: fn(&mut UserDraft, String)| {
            let draft = draft.clone();
            Callback::from(move |e: InputEvent| {
                let input: HtmlInputElement = e.target_unchecked_into();
                let mut next = (*draft).clone();
                apply(&mut next, input.value());
                draft.set(next);
            })
        };

        let onsubmit = {
            let draft = draft.clone();
            let on_submit = props.on_submit.clone();
            Callback::from(move |e: SubmitEvent| {
                e.prevent_default();
                on_submit.emit((*draft).clone());
            })
        };

        let oncancel = {
            let on_cancel = props.on_cancel.clone();
            Callback::from(move |_: MouseEvent| on_cancel.emit(()))
        };

        let editing = props.editing.is_some();

        html! {
            <form class="user-form" {onsubmit}>
                { field("first_name", "First name", "text", &draft.first_name, &props.errors,
                    setter(|d, v| d.first_name = v)) }
                { field("last_name", "Last name", "text", &draft.last_name, &props.errors,
                    setter(|d, v| d.last_name = v)) }
                { field("email", "Email", "email", &draft.email, &props.errors,
                    setter(|d, v| d.email = v)) }
                { field("phone", "Phone", "tel", &draft.phone, &props.errors,
                    setter(|d, v| d.phone = v)) }
                <div class="actions">
                    <button type="submit">{ if editing { "Update user" } else { "Add user" } }</button>
                    {
                        if editing {
                            html! { <button type="button" onclick={oncancel}>{"Cancel"}</button> }
                        } else {
                            html! {}
                        }
                    }
                </div>
            </form>
        }
    }
}

pub mod table {
    use std::collections::BTreeSet;

    use yew::prelude::*;
    use web_sys::HtmlInputElement;

    use crate::api::UserInfo;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum SortColumn {
        Id,
        FirstName,
        LastName,
        Email,
        Phone,
    }

    impl SortColumn {
        const ALL: [(SortColumn, &'static str); 5] = [
            (SortColumn::Id, "ID"),
            (SortColumn::FirstName, "First name"),
            (SortColumn::LastName, "Last name"),
            (SortColumn::Email, "Email"),
            (SortColumn::Phone, "Phone"),
        ];
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct SortState {
        pub column: SortColumn,
        pub ascending: bool,
    }

    impl Default for SortState {
        fn default() -> Self {
            Self { column: SortColumn::Id, ascending: true }
        }
    }

    impl SortState {
        /// Clicking the active column flips direction; any other column
        /// starts ascending.
        pub fn toggle(self, column: SortColumn) -> Self {
            if self.column == column {
                Self { column, ascending: !self.ascending }
            } else {
                Self { column, ascending: true }
            }
        }

        pub fn apply(&self, users: &mut [UserInfo]) {
            users.sort_by(|a, b| {
                let ordering = match self.column {
                    SortColumn::Id => a.id.cmp(&b.id),
                    SortColumn::FirstName => a.first_name.to_lowercase().cmp(&b.first_name.to_lowercase()),
                    SortColumn::LastName => a.last_name.to_lowercase().cmp(&b.last_name.to_lowercase()),
                    SortColumn::Email => a.email.to_lowercase().cmp(&b.email.to_lowercase()),
                    SortColumn::Phone => a.phone.cmp(&b.phone),
                };
                if self.ascending { ordering } else { ordering.reverse() }
            });
        }
    }

    #[derive(Properties, PartialEq)]
    pub struct UserTableProps {
        pub users: Vec<UserInfo>,
        pub sort: SortState,
        pub selected: BTreeSet<i32>,
        pub on_sort: Callback<SortColumn>,
        pub on_toggle: Callback<i32>,
        pub on_toggle_all: Callback<bool>,
        pub on_edit: Callback<UserInfo>,
        pub on_delete: Callback<i32>,
    }

    #[function_component]
    pub fn UserTable(props: &UserTableProps) -> Html {
        let all_selected = !props.users.is_empty()
            && props.users.iter().all(|user| props.selected.contains(&user.id));

        let on_toggle_all = {
            let on_toggle_all = props.on_toggle_all.clone();
            Callback::from(move |e: Event| {
                let input: HtmlInputElement = e.target_unchecked_into();
                on_toggle_all.emit(input.checked());
            })
        };

        let headers = SortColumn::ALL.iter().map(|&(column, label)| {
            let on_sort = props.on_sort.clone();
            let arrow = if props.sort.column != column {
                ""
            } else if props.sort.ascending {
                " ▲"
            } else {
                " ▼"
            };
            html! {
                <th class="sortable" onclick={Callback::from(move |_: MouseEvent| on_sort.emit(column))}>
                    { format!("{}{}", label, arrow) }
                </th>
            }
        }).collect::<Html>();

        let rows = props.users.iter().map(|user| {
            let id = user.id;
            let on_toggle = props.on_toggle.clone();
            let on_edit = props.on_edit.clone();
            let on_delete = props.on_delete.clone();
            let row = user.clone();
            html! {
                <tr key={id}>
                    <td>
                        <input
                            type="checkbox"
                            checked={props.selected.contains(&id)}
                            onchange={Callback::from(move |_: Event| on_toggle.emit(id))}
                        />
                    </td>
                    <td>{id}</td>
                    <td>{&user.first_name}</td>
                    <td>{&user.last_name}</td>
                    <td>{&user.email}</td>
                    <td>{&user.phone}</td>
                    <td>
                        <button onclick={Callback::from(move |_: MouseEvent| on_edit.emit(row.clone()))}>{"Edit"}</button>
                        <button onclick={Callback::from(move |_: MouseEvent| on_delete.emit(id))}>{"Delete"}</button>
                    </td>
                </tr>
            }
        }).collect::<Html>();

        html! {
            <table>
                <thead>
                    <tr>
                        <th><input type="checkbox" checked={all_selected} onchange={on_toggle_all} /></th>
                        { headers }
                        <th>{"Actions"}</th>
                    </tr>
                </thead>
                <tbody>
                    {
                        if props.users.is_empty() {
                            html! { <tr><td class="empty" colspan="7">{"No users found"}</td></tr> }
                        } else {
                            rows
                        }
                    }
                </tbody>
            </table>
        }
    }
}
