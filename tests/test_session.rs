//! Integration tests for the image session.
//!
//! Tests cover:
//! - De-duplication of moving and warped images
//! - Registration channel selection and the checkbox toggle rules
//! - Removal of channels
//! - Warped output naming

mod common;

use std::path::{Path, PathBuf};

use antsreg::session::warped_output_path;

use common::*;

#[test]
fn test_add_moving_images_skips_duplicates() {
    let mut session = Session::new();

    assert_eq!(session.add_moving_images(["/a.nii", "/b.nii", "/a.nii"]), 2);
    assert_eq!(session.add_moving_images(["/b.nii", "/c.nii"]), 1);

    assert_eq!(
        session.moving_images(),
        [
            PathBuf::from("/a.nii"),
            PathBuf::from("/b.nii"),
            PathBuf::from("/c.nii")
        ]
    );
}

#[test]
fn test_add_warped_images_skips_duplicates() {
    let mut session = Session::new();

    assert_eq!(session.add_warped_images(["/w1.nii", "/w1.nii"]), 1);
    assert_eq!(session.add_warped_images(["/w1.nii"]), 0);
    assert_eq!(session.warped_images().len(), 1);
}

#[test]
fn test_registration_channel_defaults_to_first() {
    let session = make_session(&["/t1.nii", "/t2.nii"]);

    assert_eq!(session.registration_channel(), 0);
    assert_eq!(session.registration_moving_image(), Some(Path::new("/t1.nii")));
}

#[test]
fn test_set_registration_channel_out_of_range() -> anyhow::Result<()> {
    let mut session = make_session(&["/t1.nii", "/t2.nii"]);

    session.set_registration_channel(1)?;
    assert_eq!(session.registration_moving_image(), Some(Path::new("/t2.nii")));

    let result = session.set_registration_channel(2);
    assert!(matches!(
        result,
        Err(Error::ChannelOutOfRange { index: 2, len: 2 })
    ));
    assert_eq!(session.registration_channel(), 1);
    Ok(())
}

#[test]
fn test_checking_channel_makes_it_the_registration_channel() {
    let mut session = make_session(&["/t1.nii", "/t2.nii", "/t3.nii"]);

    assert!(session.toggle_registration_channel(2, true));
    assert_eq!(session.registration_channel(), 2);
}

#[test]
fn test_unchecking_hands_over_to_first_other_channel() {
    let mut session = make_session(&["/t1.nii", "/t2.nii", "/t3.nii"]);

    assert!(!session.toggle_registration_channel(0, false));
    assert_eq!(session.registration_channel(), 1);

    session.toggle_registration_channel(2, true);
    assert!(!session.toggle_registration_channel(2, false));
    assert_eq!(session.registration_channel(), 0);
}

#[test]
fn test_unchecking_single_channel_is_refused() {
    let mut session = make_session(&["/t1.nii"]);

    assert!(session.toggle_registration_channel(0, false));
    assert_eq!(session.registration_channel(), 0);
}

#[test]
fn test_remove_moving_image_resets_registration_channel() -> anyhow::Result<()> {
    let mut session = make_session(&["/t1.nii", "/t2.nii", "/t3.nii"]);
    session.set_registration_channel(2)?;

    let removed = session.remove_moving_image(1)?;

    assert_eq!(removed, PathBuf::from("/t2.nii"));
    assert_eq!(session.registration_channel(), 0);
    assert_eq!(session.moving_images().len(), 2);

    let result = session.remove_moving_image(5);
    assert!(matches!(
        result,
        Err(Error::ChannelOutOfRange { index: 5, len: 2 })
    ));
    Ok(())
}

#[test]
fn test_remove_warped_image() -> anyhow::Result<()> {
    let mut session = Session::new();
    session.add_warped_images(["/w1.nii", "/w2.nii"]);

    assert_eq!(session.remove_warped_image(0)?, PathBuf::from("/w1.nii"));
    assert_eq!(session.warped_images(), [PathBuf::from("/w2.nii")]);
    assert!(session.remove_warped_image(1).is_err());
    Ok(())
}

#[test]
fn test_registration_result_replaces_warped_list() {
    let mut session = make_session(&[MOVING]);
    session.add_warped_images(["/old1.nii", "/old2.nii"]);

    session.set_registration_result(PathBuf::from("/new.nii.gz"));

    assert_eq!(session.warped_images(), [PathBuf::from("/new.nii.gz")]);
}

#[test]
fn test_warped_output_path_strips_last_extension() {
    assert_eq!(
        warped_output_path(Path::new("/scans/fixed.nii"), Path::new("/other/moving.nii")),
        PathBuf::from("/scans/moving_warped_to_fixed.nii.gz")
    );
    assert_eq!(
        warped_output_path(
            Path::new("/scans/fixed.nii.gz"),
            Path::new("/scans/moving.nii.gz")
        ),
        PathBuf::from("/scans/moving.nii_warped_to_fixed.nii.nii.gz")
    );
}

#[test]
fn test_warped_output_path_needs_both_images() -> anyhow::Result<()> {
    let mut session = Session::new();
    assert_eq!(session.warped_output_path(), None);

    session.set_fixed_image("/scans/fixed.nii");
    assert_eq!(session.warped_output_path(), None);

    session.add_moving_images(["/scans/t1.nii", "/scans/t2.nii"]);
    session.set_registration_channel(1)?;
    assert_eq!(
        session.warped_output_path(),
        Some(PathBuf::from("/scans/t2_warped_to_fixed.nii.gz"))
    );
    Ok(())
}
