/// End-to-end behaviour of the core against an in-memory store: listings,
/// engagement idempotency, lifecycle transitions and cascading deletes.

use aloite_core::{
    ActivationPolicy, ActorContext, CoreConfig, CoreError, InitiativeDraft, InitiativeEdit,
    LifecycleState, Platform, Registration,
};
use aloite_db::Database;
use aloite_types::models::EngagementLabel;
use uuid::Uuid;

fn platform() -> Platform {
    platform_with(CoreConfig::default())
}

fn platform_with(config: CoreConfig) -> Platform {
    Platform::new(Database::open_in_memory().unwrap(), config).unwrap()
}

fn register(p: &Platform, username: &str, password: &str) -> ActorContext {
    let user = p
        .register(&Registration {
            username,
            password,
            password_confirm: password,
            first_name: None,
            last_name: None,
        })
        .unwrap();
    ActorContext::user(user.id)
}

fn admin(p: &Platform) -> ActorContext {
    let user = p.ensure_admin("admin", "admin123").unwrap();
    p.resolve_actor(user.id).unwrap()
}

fn create(p: &Platform, actor: &ActorContext, title: &str, active: Option<bool>) -> Uuid {
    p.create_initiative(
        actor,
        &InitiativeDraft {
            title,
            description: "",
            active,
            start_date: None,
            end_date: None,
        },
    )
    .unwrap()
}

fn count_rows(p: &Platform, sql: &str) -> i64 {
    p.database()
        .with_conn(|conn| Ok(conn.query_row(sql, [], |r| r.get(0))?))
        .unwrap()
}

#[test]
fn free_coffee_scenario() {
    let p = platform();
    register(&p, "alice", "pw1");
    let alice = {
        let user = p.login("alice", "pw1").unwrap();
        p.resolve_actor(user.id).unwrap()
    };

    let id = create(&p, &alice, "Free coffee", Some(true));

    let listing = p.list_initiatives(&ActorContext::anonymous()).unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0].title, "Free coffee");
    assert!(listing[0].active);
    assert_eq!(listing[0].engagement_count, 0);
    assert_eq!(listing[0].creator_username, "alice");

    let first = p.sign(&alice, id).unwrap();
    assert!(first.changed);
    assert_eq!(first.count, 1);

    let again = p.sign(&alice, id).unwrap();
    assert!(!again.changed);
    assert_eq!(again.count, 1);
    assert_eq!(p.list_initiatives(&alice).unwrap()[0].engagement_count, 1);
    assert!(p.initiative(&alice, id).unwrap().engaged_by_me);

    let gone = p.unsign(&alice, id).unwrap();
    assert!(gone.changed);
    assert_eq!(gone.count, 0);

    let noop = p.unsign(&alice, id).unwrap();
    assert!(!noop.changed);
    assert_eq!(p.engagement_count(&alice, id).unwrap(), 0);
}

#[test]
fn soft_delete_restore_purge_scenario() {
    let p = platform();
    let admin = admin(&p);
    let bob = register(&p, "bob", "pw1");
    let carol = register(&p, "carol", "pw1");

    let id = create(&p, &bob, "Longer lunch breaks", Some(true));
    p.sign(&carol, id).unwrap();
    p.set_active(&bob, id, false).unwrap();

    assert_eq!(p.soft_delete(&admin, id).unwrap(), LifecycleState::SoftDeleted { was_active: false });
    assert!(p.list_initiatives(&bob).unwrap().is_empty());
    assert!(p.search(&bob, "lunch").unwrap().is_empty());
    assert!(p.initiatives_by_creator(&bob, bob.user_id().unwrap()).unwrap().is_empty());
    assert!(matches!(p.initiative(&bob, id), Err(CoreError::NotFound(_))));
    assert_eq!(p.admin_initiatives(&admin, true).unwrap().len(), 1);

    // Restore keeps the inactive flag, so it stays off the home listing.
    assert_eq!(p.restore(&admin, id).unwrap(), LifecycleState::Inactive);
    let detail = p.initiative(&bob, id).unwrap();
    assert!(!detail.summary.active);
    assert!(!detail.summary.deleted);
    assert_eq!(detail.summary.engagement_count, 1);
    assert!(p.list_initiatives(&bob).unwrap().is_empty());
    assert!(p.search(&carol, "lunch").unwrap().is_empty());
    assert_eq!(p.search(&bob, "lunch").unwrap().len(), 1);

    p.set_active(&bob, id, true).unwrap();
    assert_eq!(p.list_initiatives(&bob).unwrap().len(), 1);

    // Purge needs a soft delete first.
    assert!(matches!(p.purge(&admin, id), Err(CoreError::InvalidTransition { .. })));
    p.soft_delete(&bob, id).unwrap();
    assert_eq!(p.purge(&admin, id).unwrap(), LifecycleState::Purged);

    assert!(matches!(p.engagement_count(&admin, id), Err(CoreError::NotFound(_))));
    assert_eq!(count_rows(&p, "SELECT COUNT(*) FROM signatures"), 0);
    assert_eq!(count_rows(&p, "SELECT COUNT(*) FROM initiatives"), 0);
}

#[test]
fn restore_keeps_active_initiatives_active() {
    let p = platform();
    let admin = admin(&p);
    let bob = register(&p, "bob", "pw1");
    let id = create(&p, &bob, "New break room", None);

    p.soft_delete(&bob, id).unwrap();
    assert!(p.list_initiatives(&bob).unwrap().is_empty());
    assert_eq!(p.restore(&admin, id).unwrap(), LifecycleState::Active);
    assert_eq!(p.list_initiatives(&bob).unwrap().len(), 1);
}

#[test]
fn strangers_cannot_edit_and_row_is_unchanged() {
    let p = platform();
    let alice = register(&p, "alice", "pw1");
    let mallory = register(&p, "mallory", "pw1");
    let id = create(&p, &alice, "Free coffee", None);

    let edit = InitiativeEdit {
        title: "Free tea",
        description: "hijacked",
        start_date: None,
        end_date: None,
    };
    assert!(matches!(p.edit_initiative(&mallory, id, &edit), Err(CoreError::NotOwner)));
    assert!(matches!(p.set_active(&mallory, id, false), Err(CoreError::NotOwner)));
    assert!(matches!(p.soft_delete(&mallory, id), Err(CoreError::NotOwner)));
    assert!(matches!(p.engagements(&mallory, id), Err(CoreError::NotOwner)));
    assert!(matches!(
        p.edit_initiative(&ActorContext::anonymous(), id, &edit),
        Err(CoreError::NotAuthenticated)
    ));

    let detail = p.initiative(&mallory, id).unwrap();
    assert_eq!(detail.summary.title, "Free coffee");
    assert!(detail.summary.active);
    assert!(!detail.summary.deleted);

    let edited = p.edit_initiative(&alice, id, &edit).unwrap();
    assert_eq!(edited.title, "Free tea");
}

#[test]
fn inactive_initiatives_refuse_engagement_from_everyone() {
    let p = platform();
    let admin = admin(&p);
    let alice = register(&p, "alice", "pw1");
    let bob = register(&p, "bob", "pw1");
    let id = create(&p, &alice, "Free coffee", Some(true));
    p.sign(&bob, id).unwrap();

    p.set_active(&alice, id, false).unwrap();
    for actor in [&alice, &bob, &admin] {
        assert!(matches!(p.sign(actor, id), Err(CoreError::InitiativeInactive)));
        assert!(matches!(p.unsign(actor, id), Err(CoreError::InitiativeInactive)));
    }
    // Existing engagement survives the toggle.
    assert_eq!(p.engagement_count(&alice, id).unwrap(), 1);

    // Still visible to the owner and admins, but not on the home listing.
    assert!(p.list_initiatives(&bob).unwrap().is_empty());
    assert_eq!(p.initiatives_by_creator(&alice, alice.user_id().unwrap()).unwrap().len(), 1);
    assert!(p.initiatives_by_creator(&bob, alice.user_id().unwrap()).unwrap().is_empty());
    assert_eq!(p.admin_initiatives(&admin, false).unwrap().len(), 1);
}

#[test]
fn inactive_initiatives_are_shown_only_to_owner_and_admins() {
    let p = platform();
    let admin = admin(&p);
    let alice = register(&p, "alice", "pw1");
    let bob = register(&p, "bob", "pw1");
    let id = create(&p, &alice, "Quiet coffee corner", Some(false));

    for viewer in [bob, ActorContext::anonymous()] {
        assert!(matches!(p.initiative(&viewer, id), Err(CoreError::NotFound(_))));
        assert!(matches!(p.image(&viewer, id), Err(CoreError::NotFound(_))));
        assert!(matches!(p.engagement_count(&viewer, id), Err(CoreError::NotFound(_))));
        assert!(p.search(&viewer, "coffee").unwrap().is_empty());
        assert!(p.initiatives_by_creator(&viewer, alice.user_id().unwrap()).unwrap().is_empty());
    }

    for viewer in [alice, admin] {
        assert!(!p.initiative(&viewer, id).unwrap().summary.active);
        assert!(p.image(&viewer, id).is_ok());
        assert_eq!(p.search(&viewer, "coffee").unwrap().len(), 1);
        assert_eq!(p.initiatives_by_creator(&viewer, alice.user_id().unwrap()).unwrap().len(), 1);
    }

    // Signing still reports the inactive state rather than hiding it.
    assert!(matches!(p.sign(&bob, id), Err(CoreError::InitiativeInactive)));

    p.set_active(&alice, id, true).unwrap();
    assert!(p.initiative(&bob, id).is_ok());
    assert_eq!(p.search(&bob, "COFFEE").unwrap().len(), 1);
}

#[test]
fn anonymous_actors_cannot_sign() {
    let p = platform();
    let alice = register(&p, "alice", "pw1");
    let id = create(&p, &alice, "Free coffee", None);
    assert!(matches!(p.sign(&ActorContext::anonymous(), id), Err(CoreError::NotAuthenticated)));
    assert!(matches!(
        p.sign(&ActorContext::anonymous(), Uuid::new_v4()),
        Err(CoreError::NotAuthenticated)
    ));
    assert!(matches!(p.sign(&alice, Uuid::new_v4()), Err(CoreError::NotFound(_))));
}

#[test]
fn deleted_initiatives_never_surface_for_non_admins() {
    let p = platform();
    let admin = admin(&p);
    let alice = register(&p, "alice", "pw1");
    let keep = create(&p, &alice, "Coffee kept", None);
    let hidden = create(&p, &alice, "Coffee hidden", None);
    p.soft_delete(&alice, hidden).unwrap();

    for actor in [ActorContext::anonymous(), alice] {
        let listed: Vec<Uuid> = p.list_initiatives(&actor).unwrap().iter().map(|i| i.id).collect();
        assert_eq!(listed, vec![keep]);
        let found: Vec<Uuid> = p.search(&actor, "coffee").unwrap().iter().map(|i| i.id).collect();
        assert_eq!(found, vec![keep]);
        assert!(matches!(p.image(&actor, hidden), Err(CoreError::NotFound(_))));
    }
    // Owners cannot sign their own deleted initiative either.
    assert!(matches!(p.sign(&alice, hidden), Err(CoreError::NotFound(_))));
    // Admins see it but still cannot sign it.
    assert!(p.initiative(&admin, hidden).unwrap().summary.deleted);
    assert!(matches!(p.sign(&admin, hidden), Err(CoreError::NotFound(_))));
}

#[test]
fn restore_and_purge_are_admin_only_even_for_the_owner() {
    let p = platform();
    let admin = admin(&p);
    let alice = register(&p, "alice", "pw1");
    let bob = register(&p, "bob", "pw1");
    let id = create(&p, &alice, "Second thoughts", None);
    p.soft_delete(&alice, id).unwrap();

    for actor in [alice, bob] {
        assert!(matches!(p.restore(&actor, id), Err(CoreError::NotAdmin)));
        assert!(matches!(p.purge(&actor, id), Err(CoreError::NotAdmin)));
    }
    assert!(matches!(
        p.restore(&ActorContext::anonymous(), id),
        Err(CoreError::NotAuthenticated)
    ));
    // Unknown ids still get NotAdmin, so non-admins learn nothing from them.
    assert!(matches!(p.purge(&bob, Uuid::new_v4()), Err(CoreError::NotAdmin)));

    assert!(p.initiative(&admin, id).unwrap().summary.deleted);
    assert_eq!(p.restore(&admin, id).unwrap(), LifecycleState::Active);
}

#[test]
fn deleting_a_user_cascades() {
    let p = platform();
    let admin = admin(&p);
    let alice = register(&p, "alice", "pw1");
    let bob = register(&p, "bob", "pw1");
    let alices = create(&p, &alice, "alice's", None);
    let bobs = create(&p, &bob, "bob's", None);
    p.sign(&bob, alices).unwrap();
    p.sign(&alice, bobs).unwrap();
    p.sign(&bob, bobs).unwrap();

    let alice_id = alice.user_id().unwrap();
    assert!(matches!(p.delete_user(&bob, alice_id), Err(CoreError::NotAdmin)));

    let counts = p.delete_user(&admin, alice_id).unwrap();
    assert_eq!(counts.initiatives, 1);
    assert_eq!(counts.signatures, 2);

    assert!(matches!(p.user(alice_id), Err(CoreError::NotFound(_))));
    assert!(matches!(p.initiative(&admin, alices), Err(CoreError::NotFound(_))));
    assert_eq!(p.engagement_count(&bob, bobs).unwrap(), 1);
    assert_eq!(
        count_rows(
            &p,
            &format!(
                "SELECT COUNT(*) FROM signatures WHERE user_id = '{alice_id}'
                   OR initiative_id NOT IN (SELECT id FROM initiatives)"
            )
        ),
        0
    );
    assert_eq!(
        count_rows(&p, &format!("SELECT COUNT(*) FROM initiatives WHERE creator_id = '{alice_id}'")),
        0
    );

    // The stale session no longer resolves to a user.
    assert!(!p.resolve_actor(alice_id).unwrap().is_authenticated());
    assert!(matches!(p.delete_user(&admin, alice_id), Err(CoreError::NotFound(_))));
}

#[test]
fn admins_are_protected_from_themselves() {
    let p = platform();
    let admin = admin(&p);
    let me = admin.user_id().unwrap();
    assert!(matches!(p.delete_user(&admin, me), Err(CoreError::SelfProtect)));
    assert!(matches!(p.revoke_admin(&admin, me), Err(CoreError::SelfProtect)));
    assert!(matches!(p.grant_admin(&admin, me), Err(CoreError::SelfProtect)));
    assert!(p.user(me).unwrap().is_admin);
}

#[test]
fn granting_and_revoking_admin() {
    let p = platform();
    let admin = admin(&p);
    let bob = register(&p, "bob", "pw1");
    let bob_id = bob.user_id().unwrap();

    assert!(matches!(p.grant_admin(&bob, bob_id), Err(CoreError::NotAdmin)));
    assert!(p.grant_admin(&admin, bob_id).unwrap());
    assert!(!p.grant_admin(&admin, bob_id).unwrap());
    assert!(p.resolve_actor(bob_id).unwrap().is_admin());
    assert_eq!(p.list_users(&admin).unwrap().len(), 2);

    assert!(p.revoke_admin(&admin, bob_id).unwrap());
    assert!(!p.resolve_actor(bob_id).unwrap().is_admin());
    assert!(matches!(p.list_users(&bob), Err(CoreError::NotAdmin)));
    assert!(matches!(p.grant_admin(&admin, Uuid::new_v4()), Err(CoreError::NotFound(_))));
}

#[test]
fn registration_rules() {
    let p = platform();
    register(&p, "alice", "pw1");

    let reg = |username: &'static str, password: &'static str, confirm: &'static str| Registration {
        username,
        password,
        password_confirm: confirm,
        first_name: None,
        last_name: None,
    };
    assert!(matches!(p.register(&reg("alice", "pw1", "pw1")), Err(CoreError::DuplicateUsername(_))));
    assert!(matches!(p.register(&reg("bob", "pw1", "pw2")), Err(CoreError::Validation(_))));
    assert!(matches!(p.register(&reg("al", "pw1", "pw1")), Err(CoreError::Validation(_))));
    assert!(matches!(p.register(&reg("bob", "p", "p")), Err(CoreError::Validation(_))));
    assert!(matches!(
        p.register(&Registration { first_name: Some("B"), ..reg("bob", "pw1", "pw1") }),
        Err(CoreError::Validation(_))
    ));
    // Usernames are case-sensitive.
    register(&p, "Alice", "pw1");

    assert!(matches!(p.login("alice", "wrong"), Err(CoreError::InvalidCredentials)));
    assert!(matches!(p.login("nobody", "pw1"), Err(CoreError::InvalidCredentials)));
}

#[test]
fn activation_policy_is_configurable() {
    let p = platform_with(CoreConfig {
        activation: ActivationPolicy::Always,
        ..CoreConfig::default()
    });
    let alice = register(&p, "alice", "pw1");
    let id = create(&p, &alice, "Free coffee", Some(false));
    assert!(p.initiative(&alice, id).unwrap().summary.active);

    let p = platform();
    let alice = register(&p, "alice", "pw1");
    let id = create(&p, &alice, "Free coffee", Some(false));
    assert!(!p.initiative(&alice, id).unwrap().summary.active);
}

#[test]
fn vote_label_uses_the_same_engagement_rules() {
    let p = platform_with(CoreConfig {
        engagement_label: EngagementLabel::Vote,
        ..CoreConfig::default()
    });
    let alice = register(&p, "alice", "pw1");
    let id = create(&p, &alice, "Free coffee", None);
    assert_eq!(p.sign(&alice, id).unwrap().count, 1);
    assert_eq!(p.sign(&alice, id).unwrap().count, 1);
}

#[test]
fn images_fall_back_to_placeholder_and_respect_limit() {
    let p = platform();
    let alice = register(&p, "alice", "pw1");
    let bob = register(&p, "bob", "pw1");
    let id = create(&p, &alice, "Free coffee", None);

    let placeholder = p.image(&bob, id).unwrap();
    assert!(placeholder.starts_with(b"\x89PNG"));

    let too_big = vec![0u8; 100 * 1024 + 1];
    assert!(matches!(p.set_image(&alice, id, &too_big), Err(CoreError::ImageTooLarge { .. })));
    assert!(matches!(p.set_image(&bob, id, b"img"), Err(CoreError::NotOwner)));

    let exact = vec![7u8; 100 * 1024];
    p.set_image(&alice, id, &exact).unwrap();
    assert_eq!(p.image(&bob, id).unwrap(), exact);
    assert!(p.initiative(&bob, id).unwrap().summary.has_image);

    p.clear_image(&alice, id).unwrap();
    assert_eq!(p.image(&bob, id).unwrap(), placeholder);
}

#[test]
fn engagement_list_is_for_owner_and_admin() {
    let p = platform();
    let admin = admin(&p);
    let alice = register(&p, "alice", "pw1");
    let bob = register(&p, "bob", "pw1");
    let id = create(&p, &alice, "Free coffee", None);
    p.sign(&bob, id).unwrap();

    let list = p.engagements(&alice, id).unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].username, "bob");
    assert_eq!(p.engagements(&admin, id).unwrap().len(), 1);
    assert!(matches!(p.engagements(&bob, id), Err(CoreError::NotOwner)));
}
